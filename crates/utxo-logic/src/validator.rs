//! Validator handle bundling the collaborators with the configured parameters.

use bitcoin::Txid;
use tracing::*;
use tunnel_params::{DepositFeeSchedule, UtxoValidationParams};
use tunnel_primitives::{BitcoinAmount, ScriptHash, UtxoPointer, WithdrawalRecord};

use crate::{
    crawler::check_confirmed_deposit_spend_invalidity_with_walkback,
    deposit::{DepositConfirmation, check_deposit_confirmation_validity},
    errors::{LedgerResult, UtxoValidationResult},
    ledger::TunnelLedger,
    oracle::BitcoinOracle,
    sweep::{SweepSummary, check_sweep_validity},
    withdrawal::{WithdrawalFinalization, check_withdrawal_finalization_validity},
};

/// Runs the UTXO checks against one oracle and ledger.
///
/// Holds no state of its own beyond the handles, so it can be cloned freely and shared across
/// threads whenever the collaborators can.
#[derive(Debug)]
pub struct UtxoValidator<'a, O: ?Sized, L: ?Sized> {
    oracle: &'a O,
    ledger: &'a L,
    custody_script_hash: ScriptHash,
    params: UtxoValidationParams,
}

impl<O: ?Sized, L: ?Sized> Clone for UtxoValidator<'_, O, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O: ?Sized, L: ?Sized> Copy for UtxoValidator<'_, O, L> {}

impl<'a, O, L> UtxoValidator<'a, O, L>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    pub fn new(
        oracle: &'a O,
        ledger: &'a L,
        custody_script_hash: ScriptHash,
        params: UtxoValidationParams,
    ) -> Self {
        Self {
            oracle,
            ledger,
            custody_script_hash,
            params,
        }
    }

    pub fn params(&self) -> &UtxoValidationParams {
        &self.params
    }

    pub fn custody_script_hash(&self) -> &ScriptHash {
        &self.custody_script_hash
    }

    /// Deposit check with the configured minimum and fee schedule.
    ///
    /// The protocol fee comes from `params.deposit_fee`, not from the ledger.
    ///
    /// See [`check_deposit_confirmation_validity`].
    pub fn check_deposit(
        &self,
        txid: &Txid,
        claimed_output_index: u32,
    ) -> UtxoValidationResult<DepositConfirmation> {
        check_deposit_confirmation_validity(
            txid,
            claimed_output_index,
            self.oracle,
            &self.custody_script_hash,
            &ConfiguredFees {
                ledger: self.ledger,
                schedule: self.params.deposit_fee,
            },
            self.params.min_deposit_sats,
        )
        .inspect_err(|err| warn!(%txid, claimed_output_index, %err, "rejected deposit claim"))
    }

    /// See [`check_withdrawal_finalization_validity`].
    pub fn check_withdrawal(
        &self,
        txid: &Txid,
        withdrawal_index: u32,
        current_sweep: &UtxoPointer,
    ) -> UtxoValidationResult<WithdrawalFinalization> {
        check_withdrawal_finalization_validity(
            txid,
            withdrawal_index,
            self.oracle,
            &self.custody_script_hash,
            current_sweep,
            self.ledger,
        )
        .inspect_err(|err| warn!(%txid, withdrawal_index, %err, "rejected withdrawal claim"))
    }

    /// See [`check_sweep_validity`].
    pub fn check_sweep(
        &self,
        sweep_txid: &Txid,
        old_sweep: &UtxoPointer,
    ) -> UtxoValidationResult<SweepSummary> {
        check_sweep_validity(
            sweep_txid,
            self.oracle,
            &self.custody_script_hash,
            old_sweep,
            self.ledger,
        )
        .inspect_err(|err| warn!(%sweep_txid, %old_sweep, %err, "rejected sweep claim"))
    }

    /// Fraud proof with the configured walkback budget.
    ///
    /// See [`check_confirmed_deposit_spend_invalidity_with_walkback`].
    pub fn check_deposit_spend(
        &self,
        txid: &Txid,
        input_index: u32,
        current_sweep: &UtxoPointer,
    ) -> UtxoValidationResult<bool> {
        check_confirmed_deposit_spend_invalidity_with_walkback(
            txid,
            input_index,
            self.oracle,
            &self.custody_script_hash,
            current_sweep,
            self.ledger,
            self.params.max_sweep_utxo_walkback,
        )
        .inspect_err(|err| warn!(%txid, input_index, %err, "rejected fraud accusation"))
    }
}

/// Ledger view whose deposit fee follows the configured schedule.
#[derive(Debug)]
struct ConfiguredFees<'a, L: ?Sized> {
    ledger: &'a L,
    schedule: DepositFeeSchedule,
}

impl<L: TunnelLedger + ?Sized> TunnelLedger for ConfiguredFees<'_, L> {
    fn is_deposit_acknowledged(&self, txid: &Txid) -> LedgerResult<bool> {
        self.ledger.is_deposit_acknowledged(txid)
    }

    fn collectable_fee(&self, txid: &Txid) -> LedgerResult<BitcoinAmount> {
        self.ledger.collectable_fee(txid)
    }

    fn deposit_output_index(&self, txid: &Txid) -> LedgerResult<u32> {
        self.ledger.deposit_output_index(txid)
    }

    fn calculate_deposit_fee(&self, amount: BitcoinAmount) -> LedgerResult<BitcoinAmount> {
        Ok(self.schedule.calculate_fee(amount))
    }

    fn withdrawal_by_index(&self, index: u32) -> LedgerResult<Option<WithdrawalRecord>> {
        self.ledger.withdrawal_by_index(index)
    }
}
