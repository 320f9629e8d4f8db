//! Data types shared by the tunnel's Bitcoin-side validation.
//!
//! Everything here is a plain record: transactions as the oracle serves them, pointers into the
//! UTXO set, and the ledger entries the validators read. None of it holds behavior beyond
//! trivial accessors.

#[macro_use]
mod macros;

pub mod amount;
pub mod buf;
pub mod constants;
pub mod records;
pub mod tx;

pub use amount::BitcoinAmount;
pub use buf::{Buf20, Buf32, BufParseError, EvmAddress, ScriptHash};
pub use records::{ConfirmedDepositRecord, WithdrawalRecord};
pub use tx::{BitcoinTransaction, SpendRef, TxInput, TxOutput, UtxoPointer};
