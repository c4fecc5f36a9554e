//! Cash equity settlement (delivery versus payment).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, ContractId, Unit};
use posttrade_ledger::Transaction;

use crate::error::BuildResult;
use crate::support::{cash_product, distinct, leg, positive, transaction_id};

/// A matched equity trade ready to settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityTrade {
    pub trade_id: ContractId,
    pub settlement_time: DateTime<Utc>,
    pub security: Unit,
    pub shares: Decimal,
    pub price: Decimal,
    pub currency: Unit,
    pub buyer_securities: AccountId,
    pub buyer_cash: AccountId,
    pub seller_securities: AccountId,
    pub seller_cash: AccountId,
}

impl EquityTrade {
    /// Cash consideration: shares x price, rounded to cents.
    pub fn consideration(&self) -> BuildResult<Decimal> {
        cash_product("consideration", self.shares, self.price)
    }
}

/// Securities move seller -> buyer and cash buyer -> seller, atomically.
pub fn settle_trade(trade: &EquityTrade) -> BuildResult<Transaction> {
    let shares = positive("shares", trade.shares)?;
    positive("price", trade.price)?;
    let cash = positive("consideration", trade.consideration()?)?;
    distinct("securities", &trade.seller_securities, &trade.buyer_securities)?;
    distinct("cash", &trade.buyer_cash, &trade.seller_cash)?;

    let moves = vec![
        leg(
            &trade.seller_securities,
            &trade.buyer_securities,
            &trade.security,
            shares,
            &trade.trade_id,
        ),
        leg(
            &trade.buyer_cash,
            &trade.seller_cash,
            &trade.currency,
            cash,
            &trade.trade_id,
        ),
    ];

    Ok(Transaction::new(
        transaction_id("equity-settle", &trade.trade_id, None)?,
        trade.settlement_time,
        moves,
    )?)
}
