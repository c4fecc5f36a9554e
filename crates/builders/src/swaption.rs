//! Cash-settled swaptions.
//!
//! The option itself is represented by a synthetic token unit minted from an
//! issuance account when the contract opens and burned back on exercise, so
//! open positions show up as ordinary balances and total supply stays zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, ContractId, Unit};
use posttrade_ledger::Transaction;

use crate::error::{BuildError, BuildResult};
use crate::support::{distinct, leg, positive, transaction_id};

/// Token unit standing for one contract's options.
pub fn token_unit(contract_id: &ContractId) -> BuildResult<Unit> {
    Ok(Unit::new(format!("SWAPTION:{contract_id}"))?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwaptionOpen {
    pub contract_id: ContractId,
    pub trade_time: DateTime<Utc>,
    pub issuance_account: AccountId,
    /// Holder's derivatives account, receives the tokens.
    pub holder_position: AccountId,
    pub holder_cash: AccountId,
    pub writer_cash: AccountId,
    pub contracts: Decimal,
    pub premium_currency: Unit,
    pub premium: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwaptionExercise {
    pub contract_id: ContractId,
    pub exercise_time: DateTime<Utc>,
    pub issuance_account: AccountId,
    pub holder_position: AccountId,
    pub holder_cash: AccountId,
    pub writer_cash: AccountId,
    pub contracts: Decimal,
    pub settlement_currency: Unit,
    /// Cash owed by the writer; zero when exercised at the money.
    pub settlement_amount: Decimal,
}

/// Mint tokens to the holder and pay the premium to the writer.
pub fn open(trade: &SwaptionOpen) -> BuildResult<Transaction> {
    let contracts = positive("contracts", trade.contracts)?;
    let premium = positive("premium", trade.premium)?;
    distinct("position", &trade.issuance_account, &trade.holder_position)?;
    distinct("premium", &trade.holder_cash, &trade.writer_cash)?;

    let token = token_unit(&trade.contract_id)?;
    let moves = vec![
        leg(
            &trade.issuance_account,
            &trade.holder_position,
            &token,
            contracts,
            &trade.contract_id,
        ),
        leg(
            &trade.holder_cash,
            &trade.writer_cash,
            &trade.premium_currency,
            premium,
            &trade.contract_id,
        ),
    ];

    Ok(Transaction::new(
        transaction_id("swaption-open", &trade.contract_id, None)?,
        trade.trade_time,
        moves,
    )?)
}

/// Burn the holder's tokens and settle the cash amount writer -> holder.
pub fn exercise(event: &SwaptionExercise) -> BuildResult<Transaction> {
    let contracts = positive("contracts", event.contracts)?;
    if event.settlement_amount < Decimal::ZERO {
        return Err(BuildError::NonPositive {
            field: "settlement_amount",
            value: event.settlement_amount,
        });
    }
    distinct("position", &event.holder_position, &event.issuance_account)?;
    distinct("settlement", &event.writer_cash, &event.holder_cash)?;

    let mut moves = vec![leg(
        &event.holder_position,
        &event.issuance_account,
        &token_unit(&event.contract_id)?,
        contracts,
        &event.contract_id,
    )];
    if !event.settlement_amount.is_zero() {
        moves.push(leg(
            &event.writer_cash,
            &event.holder_cash,
            &event.settlement_currency,
            positive("settlement_amount", event.settlement_amount)?,
            &event.contract_id,
        ));
    }

    Ok(Transaction::new(
        transaction_id("swaption-exercise", &event.contract_id, None)?,
        event.exercise_time,
        moves,
    )?)
}
