use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A bitcoin amount in sats.
///
/// Oracle records and ledger fees are both denominated in this type so that fee reconciliation
/// never mixes units. Serialized as a plain integer.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshDeserialize,
    BorshSerialize,
    Deserialize,
    Serialize,
)]
#[serde(transparent)]
pub struct BitcoinAmount(u64);

impl fmt::Display for BitcoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

impl From<bitcoin::Amount> for BitcoinAmount {
    fn from(value: bitcoin::Amount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl From<BitcoinAmount> for bitcoin::Amount {
    fn from(value: BitcoinAmount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl BitcoinAmount {
    pub const ZERO: BitcoinAmount = Self(0);

    /// The number of sats in 1 bitcoin.
    pub const SATS_FACTOR: u64 = 100_000_000;

    pub const fn to_sat(&self) -> u64 {
        self.0
    }

    pub const fn from_sat(value: u64) -> Self {
        Self(value)
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns [`None`] on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self::from_sat)
    }

    /// Checked subtraction. Returns [`None`] on underflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self::from_sat)
    }

    /// Computes `self - rhs`, returning [`Self::ZERO`] on underflow.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self::from_sat(self.0.saturating_sub(rhs.0))
    }

    /// Checked sum over an iterator of amounts.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amt| acc.checked_add(amt))
    }
}
