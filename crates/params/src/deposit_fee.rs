use serde::{Deserialize, Serialize};
use tunnel_primitives::BitcoinAmount;

/// Default value for `min_fee_sats` in [`DepositFeeSchedule`].
const DEFAULT_MIN_DEPOSIT_FEE_SATS: u64 = 1_000;

/// Default value for `fee_bps` in [`DepositFeeSchedule`].
const DEFAULT_DEPOSIT_FEE_BPS: u32 = 20;

const BPS_DENOMINATOR: u128 = 10_000;

fn default_min_fee_sats() -> BitcoinAmount {
    BitcoinAmount::from_sat(DEFAULT_MIN_DEPOSIT_FEE_SATS)
}

fn default_fee_bps() -> u32 {
    DEFAULT_DEPOSIT_FEE_BPS
}

/// Protocol fee charged on a deposit: a basis-point share of the value with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositFeeSchedule {
    #[serde(default = "default_min_fee_sats")]
    pub min_fee_sats: BitcoinAmount,

    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,
}

impl Default for DepositFeeSchedule {
    fn default() -> Self {
        Self {
            min_fee_sats: default_min_fee_sats(),
            fee_bps: default_fee_bps(),
        }
    }
}

impl DepositFeeSchedule {
    /// Fee owed on a deposit of `amount`, never below `min_fee_sats`.
    pub fn calculate_fee(&self, amount: BitcoinAmount) -> BitcoinAmount {
        // u128 keeps the product exact for any u64 amount.
        let proportional = u128::from(amount.to_sat()) * u128::from(self.fee_bps) / BPS_DENOMINATOR;
        let proportional = BitcoinAmount::from_sat(u64::try_from(proportional).unwrap_or(u64::MAX));
        proportional.max(self.min_fee_sats)
    }
}
