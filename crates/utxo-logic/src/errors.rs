//! Failure kinds of the UTXO validators.
//!
//! Every check maps to its own variant so that the state-transition layer can record exactly
//! which precondition a rejected claim violated.

use std::fmt::Debug;

use bitcoin::Txid;
use thiserror::Error;
use tunnel_primitives::{BitcoinAmount, ScriptHash, UtxoPointer};

/// Generic mismatch between an expected and an observed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("(expected {expected:?}, got {got:?})")]
pub struct Mismatch<T: Debug> {
    pub expected: T,
    pub got: T,
}

impl<T: Debug> Mismatch<T> {
    pub fn new(expected: T, got: T) -> Self {
        Self { expected, got }
    }
}

/// Errors decoding the withdrawal index out of an OP_RETURN script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpReturnDecodeError {
    #[error("script does not start with OP_RETURN")]
    NotOpReturn,

    #[error("push opcode {0:#04x} cannot carry a withdrawal index")]
    UnsupportedPush(u8),

    #[error("payload too short for a withdrawal index (declared {declared}, present {present})")]
    ShortPayload { declared: usize, present: usize },
}

/// The claim references something that does not exist or violates a structural bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedClaimError {
    #[error("txid is zero")]
    ZeroTxid,

    #[error("transaction {txid} is not known")]
    TxNotFound { txid: Txid },

    #[error("deposit {txid} has already been acknowledged")]
    DepositAlreadyAcknowledged { txid: Txid },

    #[error("output index {index} is beyond the {max} exposed outputs")]
    OutputIndexOutOfRange { index: u32, max: usize },

    #[error("output {index} does not exist (transaction has {total})")]
    MissingOutput { index: u32, total: u32 },

    #[error("input {index} does not exist (transaction has {total})")]
    MissingInput { index: u32, total: u32 },

    #[error("no OP_RETURN output of {txid} carries an EVM address")]
    DepositorNotFound { txid: Txid },

    #[error("{got} inputs, expected between {min} and {max}")]
    InputCountOutOfRange { got: u32, min: usize, max: usize },

    #[error("{got} outputs, expected between {min} and {max}")]
    OutputCountOutOfRange { got: u32, min: usize, max: usize },

    #[error("input spends the wrong outpoint {0}")]
    WrongSpentOutpoint(Mismatch<UtxoPointer>),

    #[error("withdrawal {index} does not exist")]
    WithdrawalNotFound { index: u32 },

    #[error("output {index} is not the withdrawal index marker")]
    MissingWithdrawalMarker { index: u32 },

    #[error("invalid withdrawal index marker: {0}")]
    InvalidWithdrawalMarker(#[from] OpReturnDecodeError),

    #[error("withdrawal marker names the wrong withdrawal {0}")]
    WithdrawalMarkerMismatch(Mismatch<u32>),

    #[error("output {index} must carry value, found OP_RETURN")]
    UnexpectedOpReturn { index: u32 },

    #[error("deposit {txid} is either not acknowledged or already swept")]
    DepositNotUnswept { txid: Txid },

    #[error("input spends the wrong output of deposit {txid} {mismatch}")]
    DepositOutputIndex { txid: Txid, mismatch: Mismatch<u32> },
}

/// The claim is well-formed but its amounts or scripts do not reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomicMismatchError {
    #[error("output {index} pays the wrong script {mismatch}")]
    ScriptHash {
        index: u32,
        mismatch: Mismatch<ScriptHash>,
    },

    #[error("deposit of {value} is below the minimum of {min}")]
    DepositBelowMinimum {
        value: BitcoinAmount,
        min: BitcoinAmount,
    },

    #[error("deposit fee {fee} consumes the whole deposit of {value}")]
    DepositFeeTooHigh {
        value: BitcoinAmount,
        fee: BitcoinAmount,
    },

    #[error("withdrawal fee {fee} exceeds its amount {amount}")]
    WithdrawalFeeExceedsAmount {
        amount: BitcoinAmount,
        fee: BitcoinAmount,
    },

    #[error("withdrawal payout differs from amount minus fee {0}")]
    Payout(Mismatch<BitcoinAmount>),

    #[error("outputs worth {outputs} exceed the spent {input}")]
    OutputsExceedInput {
        input: BitcoinAmount,
        outputs: BitcoinAmount,
    },

    #[error("collectable fee {fee} of deposit {txid} exceeds its value {value}")]
    CollectableFeeExceedsDeposit {
        txid: Txid,
        value: BitcoinAmount,
        fee: BitcoinAmount,
    },

    #[error("sweep output {new} is worth less than the prior sweep {old}")]
    SweepValueDecreased {
        old: BitcoinAmount,
        new: BitcoinAmount,
    },

    #[error("amount overflow")]
    Overflow,
}

/// Failure of the oracle collaborator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle served a different transaction {0}")]
    TxidMismatch(Mismatch<Txid>),

    #[error("oracle record of {txid} is malformed: {reason}")]
    MalformedRecord { txid: Txid, reason: &'static str },
}

/// Failure of the ledger collaborator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtxoValidationError {
    #[error("malformed claim: {0}")]
    MalformedClaim(#[from] MalformedClaimError),

    #[error("economic mismatch: {0}")]
    EconomicMismatch(#[from] EconomicMismatchError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<OpReturnDecodeError> for UtxoValidationError {
    fn from(e: OpReturnDecodeError) -> Self {
        Self::MalformedClaim(e.into())
    }
}

pub type UtxoValidationResult<T> = Result<T, UtxoValidationError>;
