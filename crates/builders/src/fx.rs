//! FX spot settlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, ContractId, Unit};
use posttrade_ledger::Transaction;

use crate::error::{BuildError, BuildResult};
use crate::support::{cash_product, distinct, leg, positive, transaction_id};

/// Spot deal from `party`'s point of view: it sells `sell_amount` of
/// `sell_currency` and buys `sell_amount x rate` of `buy_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxSpot {
    pub deal_id: ContractId,
    pub value_time: DateTime<Utc>,
    pub party: AccountId,
    pub counterparty: AccountId,
    pub sell_currency: Unit,
    pub sell_amount: Decimal,
    pub buy_currency: Unit,
    /// Units of `buy_currency` per unit of `sell_currency`.
    pub rate: Decimal,
}

impl FxSpot {
    pub fn buy_amount(&self) -> BuildResult<Decimal> {
        cash_product("buy_amount", self.sell_amount, self.rate)
    }
}

/// Two cash legs in two currencies, settled together.
pub fn settle_spot(deal: &FxSpot) -> BuildResult<Transaction> {
    if deal.sell_currency == deal.buy_currency {
        return Err(BuildError::SameUnit {
            unit: deal.sell_currency.clone(),
        });
    }
    let sold = positive("sell_amount", deal.sell_amount)?;
    positive("rate", deal.rate)?;
    let bought = positive("buy_amount", deal.buy_amount()?)?;
    distinct("fx", &deal.party, &deal.counterparty)?;

    let moves = vec![
        leg(
            &deal.party,
            &deal.counterparty,
            &deal.sell_currency,
            sold,
            &deal.deal_id,
        ),
        leg(
            &deal.counterparty,
            &deal.party,
            &deal.buy_currency,
            bought,
            &deal.deal_id,
        ),
    ];

    Ok(Transaction::new(
        transaction_id("fx-spot", &deal.deal_id, None)?,
        deal.value_time,
        moves,
    )?)
}
