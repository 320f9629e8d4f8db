//! Read-only view of the tunnel's own bookkeeping.

use bitcoin::Txid;
use tunnel_primitives::{BitcoinAmount, ConfirmedDepositRecord, WithdrawalRecord};

use crate::errors::LedgerResult;

/// Ledger state the validators consult but never mutate.
pub trait TunnelLedger {
    /// Whether the deposit in `txid` was already credited.
    fn is_deposit_acknowledged(&self, txid: &Txid) -> LedgerResult<bool>;

    /// Fee still collectable from the deposit in `txid`. Zero if the deposit was never confirmed
    /// or has already been swept.
    fn collectable_fee(&self, txid: &Txid) -> LedgerResult<BitcoinAmount>;

    /// Output index the deposit in `txid` was confirmed at.
    fn deposit_output_index(&self, txid: &Txid) -> LedgerResult<u32>;

    /// Protocol fee owed on a deposit of `amount`.
    fn calculate_deposit_fee(&self, amount: BitcoinAmount) -> LedgerResult<BitcoinAmount>;

    fn withdrawal_by_index(&self, index: u32) -> LedgerResult<Option<WithdrawalRecord>>;

    /// The deposit in `txid`, if it is confirmed but not yet swept.
    fn confirmed_unswept_deposit(&self, txid: &Txid) -> LedgerResult<Option<ConfirmedDepositRecord>> {
        let collectable_fee = self.collectable_fee(txid)?;
        if collectable_fee.is_zero() {
            return Ok(None);
        }

        Ok(Some(ConfirmedDepositRecord {
            collectable_fee,
            output_index: self.deposit_output_index(txid)?,
        }))
    }
}

impl<T: TunnelLedger + ?Sized> TunnelLedger for &T {
    fn is_deposit_acknowledged(&self, txid: &Txid) -> LedgerResult<bool> {
        (**self).is_deposit_acknowledged(txid)
    }

    fn collectable_fee(&self, txid: &Txid) -> LedgerResult<BitcoinAmount> {
        (**self).collectable_fee(txid)
    }

    fn deposit_output_index(&self, txid: &Txid) -> LedgerResult<u32> {
        (**self).deposit_output_index(txid)
    }

    fn calculate_deposit_fee(&self, amount: BitcoinAmount) -> LedgerResult<BitcoinAmount> {
        (**self).calculate_deposit_fee(amount)
    }

    fn withdrawal_by_index(&self, index: u32) -> LedgerResult<Option<WithdrawalRecord>> {
        (**self).withdrawal_by_index(index)
    }
}
