//! Tracing and logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// Format comes from `POSTTRADE_LOG_FORMAT` (`json` or `pretty`, default
/// `json`). This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format: LogFormat = std::env::var(tracing::LOG_FORMAT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default();
    tracing::init_with(format);
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use self::tracing::{LogFormat, UnknownLogFormat};
