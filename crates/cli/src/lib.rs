//! `posttrade-replay`: rebuild ledger state from a log file and print the
//! GL report.
//!
//! ```text
//! posttrade-replay <config.json> <log.jsonl> [as_of]
//! ```
//!
//! `as_of` is an RFC 3339 knowledge time; without it the whole log is
//! replayed and the report is dated at the last knowledge time seen.
//! Output is the report's canonical JSON on one line, then its SHA-256.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};

use posttrade_accounting::{GlReport, project};
use posttrade_core::{Canonical, ContentHash};
use posttrade_infra::{FileTransactionLog, LedgerConfig, ReplayReport, rebuild, rebuild_as_of};

pub const USAGE: &str = "usage: posttrade-replay <config.json> <log.jsonl> [as_of]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    pub config_path: PathBuf,
    pub log_path: PathBuf,
    pub as_of: Option<DateTime<Utc>>,
}

impl ReplayRequest {
    pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
        let (config, log, as_of) = match args {
            [config, log] => (config, log, None),
            [config, log, as_of] => (config, log, Some(as_of)),
            _ => bail!("{USAGE}"),
        };

        let as_of = as_of
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .with_context(|| format!("as_of {raw:?} is not an RFC 3339 timestamp"))
            })
            .transpose()?;

        Ok(Self {
            config_path: PathBuf::from(config),
            log_path: PathBuf::from(log),
            as_of,
        })
    }
}

#[derive(Debug)]
pub struct ReplayOutput {
    pub replay: ReplayReport,
    pub report: GlReport,
    pub content_hash: ContentHash,
    canonical: Vec<u8>,
}

impl ReplayOutput {
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    pub fn render(&self) -> Vec<u8> {
        let mut out = self.canonical.clone();
        out.push(b'\n');
        out.extend_from_slice(self.content_hash.as_str().as_bytes());
        out.push(b'\n');
        out
    }
}

pub fn run(request: &ReplayRequest) -> anyhow::Result<ReplayOutput> {
    let config = LedgerConfig::from_path(&request.config_path)?;
    let log = FileTransactionLog::open(&request.log_path)
        .with_context(|| format!("opening log {}", request.log_path.display()))?;

    let (engine, replay) = match request.as_of {
        Some(as_of) => rebuild_as_of(config.registry()?, &log, as_of)?,
        None => rebuild(config.registry()?, &log)?,
    };
    engine
        .verify_conservation()
        .context("replayed state violates conservation")?;

    let as_of = request
        .as_of
        .or(replay.last_knowledge_time)
        .unwrap_or_default();
    let report = project(&engine.snapshot()?, &config.gl_mappings()?, as_of)?;
    report.trial_balance().context("trial balance")?;
    report.trial_balance_by_unit().context("trial balance by unit")?;

    let canonical = report.canonical_bytes()?;
    let content_hash = ContentHash::of(&canonical);

    tracing::info!(
        applied = replay.applied,
        skipped = replay.skipped,
        gl_entries = report.entries().len(),
        content_hash = %content_hash,
        "replay complete"
    );

    Ok(ReplayOutput {
        replay,
        report,
        content_hash,
        canonical,
    })
}
