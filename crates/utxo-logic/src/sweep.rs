//! Sweep validation.
//!
//! A sweep consolidates the prior custody UTXO (always input 0) and up to 7 confirmed but
//! unswept deposits into a single new custody output.

use bitcoin::{Txid, hashes::Hash};
use tracing::*;
use tunnel_primitives::{
    BitcoinAmount, ScriptHash, UtxoPointer,
    constants::{MAX_SWEEP_INPUTS, MIN_SWEEP_INPUTS},
};

use crate::{
    errors::{EconomicMismatchError, MalformedClaimError, Mismatch, UtxoValidationResult},
    ledger::TunnelLedger,
    oracle::{BitcoinOracle, TxView},
    script::script_hash,
};

/// Outcome of a valid sweep claim.
///
/// `swept_value` and `net_deposit_value` differ by the network fee paid minus the protocol fees
/// collected; both are surfaced so the caller can reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Growth of custody, `new_output_value - old sweep value`.
    pub swept_value: BitcoinAmount,

    /// Sum over swept deposits of value minus collectable fee.
    pub net_deposit_value: BitcoinAmount,

    pub new_output_value: BitcoinAmount,

    /// Deposit transactions consolidated, in input order.
    pub swept_txids: Vec<Txid>,
}

/// Checks a claim that `sweep_txid` consolidates deposits into a new custody UTXO.
///
/// # Parameters
///
/// - `sweep_txid` - The consolidating transaction
/// - `oracle` - Source of the transaction records
/// - `custody_script_hash` - Hash of the custody script the single output must pay
/// - `old_sweep` - The UTXO holding custody before this sweep, spent by input 0
/// - `ledger` - Confirmed deposit state
///
/// # Errors
///
/// Malformed claims: zero or unknown txid, input count outside 2..=8, not exactly one output,
/// input 0 not spending `old_sweep`, a later input that is not a confirmed unswept deposit or
/// spends a different output than the one confirmed.
///
/// Economic mismatches: output not paying custody, a collectable fee above its deposit's
/// value, a new output worth less than the old one.
pub fn check_sweep_validity<O, L>(
    sweep_txid: &Txid,
    oracle: &O,
    custody_script_hash: &ScriptHash,
    old_sweep: &UtxoPointer,
    ledger: &L,
) -> UtxoValidationResult<SweepSummary>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    if *sweep_txid == Txid::all_zeros() {
        return Err(MalformedClaimError::ZeroTxid.into());
    }

    let view = TxView::fetch_known(oracle, sweep_txid)?;
    let tx = view.tx();

    let n_inputs = tx.total_inputs();
    if !(MIN_SWEEP_INPUTS..=MAX_SWEEP_INPUTS).contains(&n_inputs) {
        return Err(MalformedClaimError::InputCountOutOfRange {
            got: tx.total_inputs,
            min: MIN_SWEEP_INPUTS,
            max: MAX_SWEEP_INPUTS,
        }
        .into());
    }
    if tx.total_outputs != 1 {
        return Err(MalformedClaimError::OutputCountOutOfRange {
            got: tx.total_outputs,
            min: 1,
            max: 1,
        }
        .into());
    }

    let prior = &tx.inputs[0];
    if !prior.spends(old_sweep) {
        return Err(
            MalformedClaimError::WrongSpentOutpoint(Mismatch::new(*old_sweep, prior.prev_out))
                .into(),
        );
    }

    let new_output = &tx.outputs[0];
    let got_hash = script_hash(&new_output.script_pubkey);
    if got_hash != *custody_script_hash {
        return Err(EconomicMismatchError::ScriptHash {
            index: 0,
            mismatch: Mismatch::new(*custody_script_hash, got_hash),
        }
        .into());
    }

    let mut net_deposit_value = BitcoinAmount::ZERO;
    let mut swept_txids = Vec::with_capacity(n_inputs - 1);
    for deposit_input in &tx.inputs[1..] {
        let deposit = deposit_input.prev_out;
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

        let net = deposit_input
            .value
            .checked_sub(rec.collectable_fee)
            .ok_or(EconomicMismatchError::CollectableFeeExceedsDeposit {
                txid: deposit.txid,
                value: deposit_input.value,
                fee: rec.collectable_fee,
            })?;
        net_deposit_value = net_deposit_value
            .checked_add(net)
            .ok_or(EconomicMismatchError::Overflow)?;
        swept_txids.push(deposit.txid);
    }

    let new_output_value = new_output.value;
    let swept_value =
        new_output_value
            .checked_sub(prior.value)
            .ok_or(EconomicMismatchError::SweepValueDecreased {
                old: prior.value,
                new: new_output_value,
            })?;

    debug!(
        %sweep_txid,
        deposits = swept_txids.len(),
        %swept_value,
        %net_deposit_value,
        "sweep valid"
    );

    Ok(SweepSummary {
        swept_value,
        net_deposit_value,
        new_output_value,
        swept_txids,
    })
}
