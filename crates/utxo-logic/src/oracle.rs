//! Access to Bitcoin transaction data.
//!
//! The oracle serves each transaction with at most [`MAX_EXPOSED_TX_ELEMENTS`] inputs and
//! outputs inline. [`TxView`] hides that pagination: inputs past the exposed prefix are fetched
//! on demand through [`BitcoinOracle::input_at`].

use std::borrow::Cow;

use bitcoin::Txid;
use tunnel_primitives::{
    BitcoinTransaction, TxInput, TxOutput, constants::MAX_EXPOSED_TX_ELEMENTS,
};

use crate::errors::{MalformedClaimError, Mismatch, OracleError, OracleResult, UtxoValidationResult};

/// Source of Bitcoin transaction records.
pub trait BitcoinOracle {
    /// Fetches a transaction, or `None` if the oracle does not know it.
    fn transaction_by_txid(&self, txid: &Txid) -> OracleResult<Option<BitcoinTransaction>>;

    /// Fetches a single input, including ones past the exposed prefix.
    fn input_at(&self, txid: &Txid, index: u32) -> OracleResult<Option<TxInput>>;
}

impl<T: BitcoinOracle + ?Sized> BitcoinOracle for &T {
    fn transaction_by_txid(&self, txid: &Txid) -> OracleResult<Option<BitcoinTransaction>> {
        (**self).transaction_by_txid(txid)
    }

    fn input_at(&self, txid: &Txid, index: u32) -> OracleResult<Option<TxInput>> {
        (**self).input_at(txid, index)
    }
}

/// A fetched transaction together with the oracle that can page in the rest of it.
#[derive(Debug)]
pub struct TxView<'o, O: ?Sized> {
    oracle: &'o O,
    tx: BitcoinTransaction,
}

impl<'o, O: BitcoinOracle + ?Sized> TxView<'o, O> {
    /// Fetches `txid`, checking that the record is internally consistent.
    ///
    /// Returns `None` for a transaction the oracle does not know.
    pub fn fetch(oracle: &'o O, txid: &Txid) -> OracleResult<Option<Self>> {
        let Some(tx) = oracle.transaction_by_txid(txid)? else {
            return Ok(None);
        };

        if tx.txid != *txid {
            return Err(OracleError::TxidMismatch(Mismatch::new(*txid, tx.txid)));
        }
        check_exposed_prefix(&tx)?;

        Ok(Some(Self { oracle, tx }))
    }

    /// Like [`Self::fetch`], but an unknown transaction is a malformed claim.
    pub fn fetch_known(oracle: &'o O, txid: &Txid) -> UtxoValidationResult<Self> {
        Self::fetch(oracle, txid)?
            .ok_or_else(|| MalformedClaimError::TxNotFound { txid: *txid }.into())
    }

    pub fn tx(&self) -> &BitcoinTransaction {
        &self.tx
    }

    pub fn txid(&self) -> Txid {
        self.tx.txid
    }

    pub fn total_inputs(&self) -> usize {
        self.tx.total_inputs()
    }

    pub fn total_outputs(&self) -> usize {
        self.tx.total_outputs()
    }

    /// Input at `idx`, paged in from the oracle if it lies past the exposed prefix.
    ///
    /// Returns `None` only for an index at or past the declared total.
    pub fn input(&self, idx: usize) -> OracleResult<Option<Cow<'_, TxInput>>> {
        if idx >= self.total_inputs() {
            return Ok(None);
        }
        if let Some(input) = self.tx.inputs.get(idx) {
            return Ok(Some(Cow::Borrowed(input)));
        }

        let input = self
            .oracle
            .input_at(&self.tx.txid, idx as u32)?
            .ok_or(OracleError::MalformedRecord {
                txid: self.tx.txid,
                reason: "declared input not served",
            })?;
        Ok(Some(Cow::Owned(input)))
    }

    /// Exposed output at `idx`.
    pub fn output(&self, idx: usize) -> Option<&TxOutput> {
        self.tx.output(idx)
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.tx.outputs
    }
}

/// The exposed prefixes must be exactly as long as the pagination rule says.
fn check_exposed_prefix(tx: &BitcoinTransaction) -> OracleResult<()> {
    let expected_inputs = tx.total_inputs().min(MAX_EXPOSED_TX_ELEMENTS);
    let expected_outputs = tx.total_outputs().min(MAX_EXPOSED_TX_ELEMENTS);

    if tx.inputs.len() != expected_inputs {
        return Err(OracleError::MalformedRecord {
            txid: tx.txid,
            reason: "exposed inputs disagree with declared total",
        });
    }
    if tx.outputs.len() != expected_outputs {
        return Err(OracleError::MalformedRecord {
            txid: tx.txid,
            reason: "exposed outputs disagree with declared total",
        });
    }
    if tx.inputs_complete != (expected_inputs == tx.total_inputs())
        || tx.outputs_complete != (expected_outputs == tx.total_outputs())
    {
        return Err(OracleError::MalformedRecord {
            txid: tx.txid,
            reason: "completeness flags disagree with declared totals",
        });
    }

    Ok(())
}
