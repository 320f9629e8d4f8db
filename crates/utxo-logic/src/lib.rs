//! UTXO validation for the Bitcoin side of the tunnel.
//!
//! The vault state machine on the EVM side holds custody of deposited BTC in a single sweep UTXO.
//! Before applying a deposit, withdrawal or sweep it asks this crate whether the Bitcoin
//! transaction backing the claim is shaped correctly and economically consistent with the
//! ledger. The fraud proof in [`crawler`] lets anyone show that a confirmed deposit was spent by
//! a transaction that does not descend from the live custody UTXO.
//!
//! Every check is a pure function of what the [`BitcoinOracle`] and [`TunnelLedger`] return.

pub mod crawler;
pub mod deposit;
pub mod errors;
pub mod ledger;
pub mod opreturn;
pub mod oracle;
pub mod script;
pub mod sweep;
pub mod validator;
pub mod withdrawal;

#[cfg(test)]
mod test_utils;

pub use crawler::{
    check_confirmed_deposit_spend_invalidity,
    check_confirmed_deposit_spend_invalidity_with_walkback,
};
pub use deposit::{DepositConfirmation, check_deposit_confirmation_validity};
pub use errors::{
    EconomicMismatchError, LedgerError, MalformedClaimError, Mismatch, OpReturnDecodeError,
    OracleError, UtxoValidationError, UtxoValidationResult,
};
pub use ledger::TunnelLedger;
pub use opreturn::{decode_withdrawal_index, withdrawal_marker_script};
pub use oracle::{BitcoinOracle, TxView};
pub use script::{extract_evm_address, script_hash};
pub use sweep::{SweepSummary, check_sweep_validity};
pub use validator::UtxoValidator;
pub use withdrawal::{WithdrawalFinalization, check_withdrawal_finalization_validity};
