//! Credit default swap premium leg.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, ContractId, Unit};
use posttrade_ledger::Transaction;

use crate::error::{BuildError, BuildResult};
use crate::support::{CASH_DP, distinct, leg, positive, transaction_id};

/// One premium period of a CDS contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumPayment {
    pub contract_id: ContractId,
    /// Period reference, e.g. "2024Q1".
    pub period: String,
    pub payment_time: DateTime<Utc>,
    /// Protection buyer's cash account.
    pub buyer: AccountId,
    /// Protection seller's cash account.
    pub seller: AccountId,
    pub currency: Unit,
    pub notional: Decimal,
    /// Running spread as a fraction (0.01 = 100bp).
    pub spread: Decimal,
    /// Year fraction of the accrual period.
    pub accrual_fraction: Decimal,
}

impl PremiumPayment {
    /// notional x spread x accrual fraction, rounded to cents (banker's rounding).
    pub fn premium(&self) -> BuildResult<Decimal> {
        self.notional
            .checked_mul(self.spread)
            .and_then(|v| v.checked_mul(self.accrual_fraction))
            .map(|v| v.round_dp(CASH_DP))
            .ok_or(BuildError::Overflow { field: "premium" })
    }
}

/// Premium cash buyer -> seller.
pub fn pay_premium(payment: &PremiumPayment) -> BuildResult<Transaction> {
    positive("notional", payment.notional)?;
    positive("spread", payment.spread)?;
    positive("accrual_fraction", payment.accrual_fraction)?;
    let premium = positive("premium", payment.premium()?)?;
    distinct("premium", &payment.buyer, &payment.seller)?;

    Ok(Transaction::new(
        transaction_id("cds-premium", &payment.contract_id, Some(&payment.period))?,
        payment.payment_time,
        vec![leg(
            &payment.buyer,
            &payment.seller,
            &payment.currency,
            premium,
            &payment.contract_id,
        )],
    )?)
}
