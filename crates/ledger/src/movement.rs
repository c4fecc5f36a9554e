use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{
    AccountId, Canonical, ContractId, DomainError, DomainResult, Unit, ValueObject, canonical,
};

/// A strictly positive amount of some unit.
///
/// Direction is carried by a move's source and destination, never by sign, so
/// zero and negative quantities cannot be constructed (or decoded).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::non_positive("quantity", value));
        }
        Ok(Self(canonical::normalize(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Quantity {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let parsed =
            Decimal::from_str(&value).map_err(|e| DomainError::invalid("quantity", e.to_string()))?;
        Self::new(parsed)
    }
}

impl From<Quantity> for String {
    fn from(value: Quantity) -> Self {
        value.0.to_string()
    }
}

impl ValueObject for Quantity {}

/// One directed transfer of a unit between two accounts.
///
/// Applying a move debits `source` and credits `destination` by exactly
/// `quantity`; the unit's total across all accounts is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    source: AccountId,
    destination: AccountId,
    unit: Unit,
    quantity: Quantity,
    contract_id: ContractId,
}

impl Move {
    pub fn new(
        source: AccountId,
        destination: AccountId,
        unit: Unit,
        quantity: Quantity,
        contract_id: ContractId,
    ) -> Self {
        Self {
            source,
            destination,
            unit,
            quantity,
            contract_id,
        }
    }

    pub fn source(&self) -> &AccountId {
        &self.source
    }

    pub fn destination(&self) -> &AccountId {
        &self.destination
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }
}

impl ValueObject for Move {}
impl Canonical for Move {}
