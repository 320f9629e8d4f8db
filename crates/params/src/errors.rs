use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_sweep_utxo_walkback must be at least 1")]
    ZeroWalkback,

    #[error("deposit fee of {fee_bps} bps exceeds 100%")]
    FeeBpsTooHigh { fee_bps: u32 },
}
