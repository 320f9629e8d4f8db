//! Tunable parameters of the tunnel's Bitcoin-side validation.

mod deposit_fee;
mod errors;
mod validation;

pub use deposit_fee::DepositFeeSchedule;
pub use errors::ParamsError;
pub use validation::{TunnelConfig, UtxoValidationParams};
