//! Withdrawal finalization.
//!
//! A withdrawal is fulfilled by a transaction that spends the current sweep UTXO and lays out
//! its outputs as:
//!
//! - output 0: the payout to the user's destination script, worth `amount - fee`
//! - output 1: optional change back to the custody script
//! - last output: the OP_RETURN marker carrying the withdrawal index
//!
//! Whatever the transaction pays to miners is reconciled against the fee the user was charged.

use bitcoin::Txid;
use tracing::*;
use tunnel_primitives::{
    BitcoinAmount, ScriptHash, TxOutput, UtxoPointer, constants::WITHDRAWAL_CHANGE_VOUT,
};

use crate::{
    errors::{EconomicMismatchError, MalformedClaimError, Mismatch, UtxoValidationResult},
    ledger::TunnelLedger,
    opreturn::decode_withdrawal_index,
    oracle::{BitcoinOracle, TxView},
    script::script_hash,
};

/// Payout plus the index marker.
const MIN_WITHDRAWAL_OUTPUTS: usize = 2;

/// Payout, change and the index marker.
const MAX_WITHDRAWAL_OUTPUTS: usize = 3;

/// Outcome of a valid withdrawal finalization claim.
///
/// At most one of `fees_overpaid` and `fees_collected` is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalFinalization {
    /// Network fee paid beyond what the user was charged.
    pub fees_overpaid: BitcoinAmount,

    /// Part of the user's fee left over after paying the network.
    pub fees_collected: BitcoinAmount,

    /// Gross amount of the withdrawal record.
    pub amount: BitcoinAmount,

    pub created_change: bool,

    /// Value returned to custody, zero without change.
    pub change_value: BitcoinAmount,
}

impl WithdrawalFinalization {
    /// The change output, which becomes the new sweep UTXO.
    pub fn change_outpoint(&self, txid: Txid) -> Option<UtxoPointer> {
        self.created_change
            .then_some(UtxoPointer::new(txid, WITHDRAWAL_CHANGE_VOUT))
    }
}

/// Checks a claim that `txid` fulfills withdrawal `withdrawal_index`.
///
/// # Parameters
///
/// - `txid` - The fulfilling transaction
/// - `withdrawal_index` - Ledger index of the withdrawal being fulfilled
/// - `oracle` - Source of the transaction record
/// - `custody_script_hash` - Hash of the custody script any change must pay
/// - `current_sweep` - The UTXO currently holding custody, which must be the only input
/// - `ledger` - Source of the withdrawal record
///
/// # Returns
///
/// - `Ok(WithdrawalFinalization)` - The claim is valid, with the fee reconciliation
/// - `Err(UtxoValidationError)` - The first violated check
///
/// # Errors
///
/// Malformed claims: unknown transaction, not exactly one input, the input not spending
/// `current_sweep`, fewer than 2 or more than 3 outputs, unknown withdrawal, a missing or wrong
/// index marker, an OP_RETURN in the change slot.
///
/// Economic mismatches: payout to the wrong script or of the wrong value, change not paying
/// custody, outputs exceeding the input.
pub fn check_withdrawal_finalization_validity<O, L>(
    txid: &Txid,
    withdrawal_index: u32,
    oracle: &O,
    custody_script_hash: &ScriptHash,
    current_sweep: &UtxoPointer,
    ledger: &L,
) -> UtxoValidationResult<WithdrawalFinalization>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    let view = TxView::fetch_known(oracle, txid)?;
    let tx = view.tx();

    if tx.total_inputs != 1 {
        return Err(MalformedClaimError::InputCountOutOfRange {
            got: tx.total_inputs,
            min: 1,
            max: 1,
        }
        .into());
    }
    let input = &tx.inputs[0];
    if !input.spends(current_sweep) {
        return Err(
            MalformedClaimError::WrongSpentOutpoint(Mismatch::new(*current_sweep, input.prev_out))
                .into(),
        );
    }

    let n_outputs = tx.total_outputs();
    if !(MIN_WITHDRAWAL_OUTPUTS..=MAX_WITHDRAWAL_OUTPUTS).contains(&n_outputs) {
        return Err(MalformedClaimError::OutputCountOutOfRange {
            got: tx.total_outputs,
            min: MIN_WITHDRAWAL_OUTPUTS,
            max: MAX_WITHDRAWAL_OUTPUTS,
        }
        .into());
    }

    let record = ledger
        .withdrawal_by_index(withdrawal_index)?
        .ok_or(MalformedClaimError::WithdrawalNotFound {
            index: withdrawal_index,
        })?;

    let payout = &tx.outputs[0];
    let expected_dest = script_hash(&record.destination_script);
    let got_dest = script_hash(&payout.script_pubkey);
    if got_dest != expected_dest {
        return Err(EconomicMismatchError::ScriptHash {
            index: 0,
            mismatch: Mismatch::new(expected_dest, got_dest),
        }
        .into());
    }

    let expected_payout = record
        .payout()
        .ok_or(EconomicMismatchError::WithdrawalFeeExceedsAmount {
            amount: record.amount,
            fee: record.fee,
        })?;
    if payout.value != expected_payout {
        return Err(
            EconomicMismatchError::Payout(Mismatch::new(expected_payout, payout.value)).into(),
        );
    }

    // The marker always comes last, change (if any) sits between it and the payout.
    let marker_vout = n_outputs - 1;
    check_index_marker(&tx.outputs[marker_vout], marker_vout as u32, withdrawal_index)?;

    let change = if n_outputs == MAX_WITHDRAWAL_OUTPUTS {
        let change = &tx.outputs[WITHDRAWAL_CHANGE_VOUT as usize];
        check_change_output(change, custody_script_hash)?;
        Some(change.value)
    } else {
        None
    };

    let outputs_total = BitcoinAmount::checked_sum(tx.outputs.iter().map(|o| o.value))
        .ok_or(EconomicMismatchError::Overflow)?;
    let actual_btc_fee =
        input
            .value
            .checked_sub(outputs_total)
            .ok_or(EconomicMismatchError::OutputsExceedInput {
                input: input.value,
                outputs: outputs_total,
            })?;

    let fin = WithdrawalFinalization {
        fees_overpaid: actual_btc_fee.saturating_sub(record.fee),
        fees_collected: record.fee.saturating_sub(actual_btc_fee),
        amount: record.amount,
        created_change: change.is_some(),
        change_value: change.unwrap_or(BitcoinAmount::ZERO),
    };

    debug!(
        %txid,
        withdrawal_index,
        %actual_btc_fee,
        overpaid = %fin.fees_overpaid,
        collected = %fin.fees_collected,
        "withdrawal finalization valid"
    );

    Ok(fin)
}

fn check_index_marker(
    marker: &TxOutput,
    vout: u32,
    withdrawal_index: u32,
) -> UtxoValidationResult<()> {
    if !marker.is_op_return {
        return Err(MalformedClaimError::MissingWithdrawalMarker { index: vout }.into());
    }

    let decoded = decode_withdrawal_index(&marker.script_pubkey)?;
    if decoded != withdrawal_index {
        return Err(
            MalformedClaimError::WithdrawalMarkerMismatch(Mismatch::new(withdrawal_index, decoded))
                .into(),
        );
    }

    Ok(())
}

fn check_change_output(change: &TxOutput, custody_script_hash: &ScriptHash) -> UtxoValidationResult<()> {
    if change.is_op_return {
        return Err(MalformedClaimError::UnexpectedOpReturn {
            index: WITHDRAWAL_CHANGE_VOUT,
        }
        .into());
    }

    let got = script_hash(&change.script_pubkey);
    if got != *custody_script_hash {
        return Err(EconomicMismatchError::ScriptHash {
            index: WITHDRAWAL_CHANGE_VOUT,
            mismatch: Mismatch::new(*custody_script_hash, got),
        }
        .into());
    }

    Ok(())
}
