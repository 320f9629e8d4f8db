//! Fraud proof over the custody spend graph.
//!
//! Custody moves along a chain of sweeps and withdrawal change outputs. A confirmed deposit may
//! only be spent by a sweep whose custody input descends from the current sweep UTXO. The crawler
//! walks that chain backwards from the accused spend and reports whether the link is broken.
//!
//! Each hop only checks the shape of the ancestor. Economic validity of earlier links was
//! established when they were finalized.

use bitcoin::Txid;
use tracing::*;
use tunnel_primitives::{
    ScriptHash, UtxoPointer,
    constants::{MAX_SWEEP_INPUTS, MAX_SWEEP_UTXO_WALKBACK, MIN_SWEEP_INPUTS, WITHDRAWAL_CHANGE_VOUT},
};

use crate::{
    errors::{MalformedClaimError, Mismatch, UtxoValidationResult},
    ledger::TunnelLedger,
    oracle::{BitcoinOracle, TxView},
    script::script_hash,
};

/// How an ancestor on the custody chain relates to the output it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Withdrawal paying its change back to custody at this output index.
    Withdrawal { vout: u32 },

    /// Sweep consolidating into its single output.
    Sweep,

    /// Any other shape.
    Foreign,
}

impl Link {
    fn classify<O: BitcoinOracle + ?Sized>(ancestor: &TxView<'_, O>, vout: u32) -> Self {
        let tx = ancestor.tx();
        let n_inputs = tx.total_inputs();
        let n_outputs = tx.total_outputs();

        if n_inputs == 1 && tx.outputs_complete && n_outputs <= 3 && tx.value_output_count() == 2 {
            return Self::Withdrawal { vout };
        }
        if is_sweep_shape(n_inputs, n_outputs) {
            return Self::Sweep;
        }
        Self::Foreign
    }

    fn is_legit(self) -> bool {
        match self {
            Self::Withdrawal { vout } => vout == WITHDRAWAL_CHANGE_VOUT,
            Self::Sweep => true,
            Self::Foreign => false,
        }
    }
}

fn is_sweep_shape(n_inputs: usize, n_outputs: usize) -> bool {
    (MIN_SWEEP_INPUTS..=MAX_SWEEP_INPUTS).contains(&n_inputs) && n_outputs == 1
}

/// Decides whether the spend of a confirmed deposit at `input_index` of `txid` is invalid, with
/// the default hop budget.
///
/// See [`check_confirmed_deposit_spend_invalidity_with_walkback`].
pub fn check_confirmed_deposit_spend_invalidity<O, L>(
    txid: &Txid,
    input_index: u32,
    oracle: &O,
    custody_script_hash: &ScriptHash,
    current_sweep: &UtxoPointer,
    ledger: &L,
) -> UtxoValidationResult<bool>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    check_confirmed_deposit_spend_invalidity_with_walkback(
        txid,
        input_index,
        oracle,
        custody_script_hash,
        current_sweep,
        ledger,
        MAX_SWEEP_UTXO_WALKBACK,
    )
}

/// Decides whether the spend of a confirmed deposit at `input_index` of `txid` is invalid.
///
/// # Parameters
///
/// - `txid` - The accused spending transaction
/// - `input_index` - The input that consumes the deposit
/// - `oracle` - Source of the transaction records
/// - `custody_script_hash` - Hash of the custody script
/// - `current_sweep` - The live custody UTXO
/// - `ledger` - Confirmed deposit state
/// - `max_walkback` - Maximum number of ancestors to resolve
///
/// # Returns
///
/// `true` when the spend is proven illegitimate: the accused transaction is not a well-formed
/// sweep, or its custody input does not descend from `current_sweep` through legitimate links
/// within `max_walkback` hops. `false` when the chain resolves.
///
/// # Errors
///
/// Only when the accusation itself is malformed (unknown transaction, missing input, an input
/// that is not a confirmed unswept deposit at its recorded output) or a collaborator fails.
pub fn check_confirmed_deposit_spend_invalidity_with_walkback<O, L>(
    txid: &Txid,
    input_index: u32,
    oracle: &O,
    custody_script_hash: &ScriptHash,
    current_sweep: &UtxoPointer,
    ledger: &L,
    max_walkback: u32,
) -> UtxoValidationResult<bool>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    let view = TxView::fetch_known(oracle, txid)?;
    let accused = view
        .input(input_index as usize)?
        .ok_or(MalformedClaimError::MissingInput {
            index: input_index,
            total: view.tx().total_inputs,
        })?;

    let deposit = accused.prev_out;
    let Some(rec) = ledger.confirmed_unswept_deposit(&deposit.txid)? else {
        return Err(MalformedClaimError::DepositNotUnswept { txid: deposit.txid }.into());
    };
    if rec.output_index != deposit.vout {
        return Err(MalformedClaimError::DepositOutputIndex {
            txid: deposit.txid,
            mismatch: Mismatch::new(rec.output_index, deposit.vout),
        }
        .into());
    }

    if input_index == 0 {
        info!(%txid, %deposit, "deposit spent as custody input");
        return Ok(true);
    }

    if !is_sweep_shape(view.total_inputs(), view.total_outputs()) {
        info!(
            %txid,
            inputs = view.total_inputs(),
            outputs = view.total_outputs(),
            "deposit spent outside a sweep"
        );
        return Ok(true);
    }

    let pays_custody = view
        .output(0)
        .is_some_and(|out| script_hash(&out.script_pubkey) == *custody_script_hash);
    if !pays_custody {
        info!(%txid, "sweep output does not return to custody");
        return Ok(true);
    }

    // The shape check bounds the inputs to the exposed prefix.
    for (idx, other) in view.tx().inputs.iter().enumerate().skip(1) {
        let prev = other.prev_out;
        let legit = ledger
            .confirmed_unswept_deposit(&prev.txid)?
            .is_some_and(|r| r.output_index == prev.vout);
        if !legit {
            info!(%txid, input = idx, %prev, "sweep consumes a non-deposit input");
            return Ok(true);
        }
    }

    let mut cursor = view.tx().inputs[0].prev_out;
    let mut hops = 0u32;
    loop {
        if cursor == *current_sweep {
            trace!(%txid, hops, "custody chain resolved");
            return Ok(false);
        }
        if hops == max_walkback {
            info!(%txid, hops, %cursor, "custody chain exceeds walkback budget");
            return Ok(true);
        }
        hops += 1;

        let Some(ancestor) = TxView::fetch(oracle, &cursor.txid)? else {
            info!(%txid, hops, %cursor, "custody chain reaches unknown transaction");
            return Ok(true);
        };

        let link = Link::classify(&ancestor, cursor.vout);
        trace!(%txid, hops, %cursor, ?link, "custody chain hop");
        if !link.is_legit() {
            info!(%txid, hops, %cursor, ?link, "custody chain broken");
            return Ok(true);
        }

        // Both legitimate shapes have at least one input, always exposed.
        let Some(next) = ancestor.tx().inputs.first() else {
            return Ok(true);
        };
        cursor = next.prev_out;
    }
}
