//! In-memory collaborators and transaction builders for unit tests.

use std::{
    cell::Cell,
    collections::{HashMap, HashSet},
};

use bitcoin::{
    ScriptBuf, Txid,
    hashes::Hash,
    opcodes::all::{OP_PUSHDATA1, OP_RETURN},
};
use tunnel_params::DepositFeeSchedule;
use tunnel_primitives::{
    BitcoinAmount, BitcoinTransaction, ConfirmedDepositRecord, EvmAddress, ScriptHash, TxInput,
    TxOutput, UtxoPointer, WithdrawalRecord,
};

use crate::{
    errors::{LedgerResult, OracleError, OracleResult},
    ledger::TunnelLedger,
    oracle::BitcoinOracle,
    script::script_hash,
};

pub(crate) fn txid(b: u8) -> Txid {
    Txid::from_byte_array([b; 32])
}

pub(crate) fn sats(v: u64) -> BitcoinAmount {
    BitcoinAmount::from_sat(v)
}

pub(crate) fn input(prev: Txid, vout: u32, value: u64) -> TxInput {
    TxInput::new(UtxoPointer::new(prev, vout), sats(value))
}

pub(crate) fn output(value: u64, script: ScriptBuf) -> TxOutput {
    TxOutput::from_script(sats(value), script)
}

/// Taproot-shaped script standing in for the vault's custody script.
pub(crate) fn custody_script() -> ScriptBuf {
    let mut bytes = vec![0x51, 0x20];
    bytes.extend_from_slice(&[0xcc; 32]);
    ScriptBuf::from_bytes(bytes)
}

pub(crate) fn custody_hash() -> ScriptHash {
    script_hash(&custody_script())
}

/// P2WPKH-shaped user script.
pub(crate) fn user_script(b: u8) -> ScriptBuf {
    let mut bytes = vec![0x00, 0x14];
    bytes.extend_from_slice(&[b; 20]);
    ScriptBuf::from_bytes(bytes)
}

/// `OP_RETURN` pushing `payload` with the minimal push opcode.
pub(crate) fn op_return_script(payload: &[u8]) -> ScriptBuf {
    let mut bytes = vec![OP_RETURN.to_u8()];
    if payload.len() > 75 {
        bytes.push(OP_PUSHDATA1.to_u8());
    }
    bytes.push(payload.len() as u8);
    bytes.extend_from_slice(payload);
    ScriptBuf::from_bytes(bytes)
}

pub(crate) fn op_return(payload: &[u8]) -> TxOutput {
    output(0, op_return_script(payload))
}

pub(crate) fn address(b: u8) -> EvmAddress {
    EvmAddress::new([b; 20])
}

#[derive(Debug, Default)]
pub(crate) struct MemOracle {
    txs: HashMap<Txid, BitcoinTransaction>,
    full_inputs: HashMap<Txid, Vec<TxInput>>,
    unavailable: bool,
    lookups: Cell<usize>,
    input_at_calls: Cell<usize>,
}

impl MemOracle {
    /// Registers a transaction, exposing it the way the oracle would.
    pub(crate) fn insert(&mut self, id: Txid, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Txid {
        self.full_inputs.insert(id, inputs.clone());
        self.txs
            .insert(id, BitcoinTransaction::from_full(id, inputs, outputs));
        id
    }

    /// Edits the served record in place, bypassing the pagination rules.
    pub(crate) fn tamper(&mut self, id: &Txid, f: impl FnOnce(&mut BitcoinTransaction)) {
        if let Some(tx) = self.txs.get_mut(id) {
            f(tx);
        }
    }

    /// Stops serving the inputs past the exposed prefix of `id`.
    pub(crate) fn drop_paged_inputs(&mut self, id: &Txid) {
        self.full_inputs.remove(id);
    }

    pub(crate) fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.get()
    }

    pub(crate) fn input_at_calls(&self) -> usize {
        self.input_at_calls.get()
    }
}

impl BitcoinOracle for MemOracle {
    fn transaction_by_txid(&self, txid: &Txid) -> OracleResult<Option<BitcoinTransaction>> {
        if self.unavailable {
            return Err(OracleError::Unavailable("test oracle offline".to_owned()));
        }
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.txs.get(txid).cloned())
    }

    fn input_at(&self, txid: &Txid, index: u32) -> OracleResult<Option<TxInput>> {
        self.input_at_calls.set(self.input_at_calls.get() + 1);
        Ok(self
            .full_inputs
            .get(txid)
            .and_then(|inputs| inputs.get(index as usize))
            .cloned())
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemLedger {
    acknowledged: HashSet<Txid>,
    deposits: HashMap<Txid, ConfirmedDepositRecord>,
    withdrawals: HashMap<u32, WithdrawalRecord>,
    fixed_fees: HashMap<BitcoinAmount, BitcoinAmount>,
    fee_schedule: DepositFeeSchedule,
}

impl MemLedger {
    pub(crate) fn with_fee_schedule(fee_schedule: DepositFeeSchedule) -> Self {
        Self {
            fee_schedule,
            ..Default::default()
        }
    }

    pub(crate) fn acknowledge(&mut self, txid: Txid) {
        self.acknowledged.insert(txid);
    }

    pub(crate) fn confirm_deposit(&mut self, txid: Txid, output_index: u32, collectable_fee: u64) {
        self.deposits.insert(
            txid,
            ConfirmedDepositRecord {
                collectable_fee: sats(collectable_fee),
                output_index,
            },
        );
    }

    /// Overrides the fee schedule for one exact deposit value.
    pub(crate) fn set_deposit_fee(&mut self, amount: u64, fee: u64) {
        self.fixed_fees.insert(sats(amount), sats(fee));
    }

    pub(crate) fn add_withdrawal(
        &mut self,
        index: u32,
        amount: u64,
        fee: u64,
        destination_script: ScriptBuf,
    ) -> WithdrawalRecord {
        let rec = WithdrawalRecord {
            counter: index as u64,
            amount: sats(amount),
            fee: sats(fee),
            timestamp_requested: 1_700_000_000,
            destination_script,
            evm_originator: address(0x11),
        };
        self.withdrawals.insert(index, rec.clone());
        rec
    }
}

impl TunnelLedger for MemLedger {
    fn is_deposit_acknowledged(&self, txid: &Txid) -> LedgerResult<bool> {
        Ok(self.acknowledged.contains(txid))
    }

    fn collectable_fee(&self, txid: &Txid) -> LedgerResult<BitcoinAmount> {
        Ok(self
            .deposits
            .get(txid)
            .map(|d| d.collectable_fee)
            .unwrap_or(BitcoinAmount::ZERO))
    }

    fn deposit_output_index(&self, txid: &Txid) -> LedgerResult<u32> {
        Ok(self.deposits.get(txid).map(|d| d.output_index).unwrap_or(0))
    }

    fn calculate_deposit_fee(&self, amount: BitcoinAmount) -> LedgerResult<BitcoinAmount> {
        Ok(self
            .fixed_fees
            .get(&amount)
            .copied()
            .unwrap_or_else(|| self.fee_schedule.calculate_fee(amount)))
    }

    fn withdrawal_by_index(&self, index: u32) -> LedgerResult<Option<WithdrawalRecord>> {
        Ok(self.withdrawals.get(&index).cloned())
    }
}
