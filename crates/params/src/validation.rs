use serde::{Deserialize, Serialize};
use tunnel_common::logging::LoggerConfig;
use tunnel_primitives::{BitcoinAmount, constants::MAX_SWEEP_UTXO_WALKBACK};

use crate::{DepositFeeSchedule, ParamsError};

/// Default value for `min_deposit_sats` in [`UtxoValidationParams`].
const DEFAULT_MIN_DEPOSIT_SATS: u64 = 10_000;

fn default_min_deposit_sats() -> BitcoinAmount {
    BitcoinAmount::from_sat(DEFAULT_MIN_DEPOSIT_SATS)
}

fn default_max_sweep_utxo_walkback() -> u32 {
    MAX_SWEEP_UTXO_WALKBACK
}

/// Parameters the UTXO validators are run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoValidationParams {
    /// Smallest deposit output that may be credited.
    #[serde(default = "default_min_deposit_sats")]
    pub min_deposit_sats: BitcoinAmount,

    /// Hop budget of the spend-graph walk behind fraud proofs.
    #[serde(default = "default_max_sweep_utxo_walkback")]
    pub max_sweep_utxo_walkback: u32,

    #[serde(default)]
    pub deposit_fee: DepositFeeSchedule,
}

impl Default for UtxoValidationParams {
    fn default() -> Self {
        Self {
            min_deposit_sats: default_min_deposit_sats(),
            max_sweep_utxo_walkback: default_max_sweep_utxo_walkback(),
            deposit_fee: DepositFeeSchedule::default(),
        }
    }
}

impl UtxoValidationParams {
    /// Checks the bounds serde cannot express.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_sweep_utxo_walkback == 0 {
            return Err(ParamsError::ZeroWalkback);
        }
        if self.deposit_fee.fee_bps > 10_000 {
            return Err(ParamsError::FeeBpsTooHigh {
                fee_bps: self.deposit_fee.fee_bps,
            });
        }
        Ok(())
    }
}

/// Top-level config file of a process embedding the validators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelConfig {
    #[serde(default)]
    pub validation: UtxoValidationParams,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl TunnelConfig {
    /// Parses and validates a TOML config.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let config: Self = toml::from_str(s)?;
        config.validation.validate()?;
        Ok(config)
    }
}
