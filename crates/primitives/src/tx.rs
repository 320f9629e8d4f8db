//! Transaction records as served by the Bitcoin data oracle.
//!
//! The oracle never hands out more than [`MAX_EXPOSED_TX_ELEMENTS`] inputs or outputs inline.
//! A [`BitcoinTransaction`] therefore carries the declared totals next to the exposed prefixes,
//! and anything in between must be fetched one element at a time.

use std::{
    fmt,
    io::{self, Read, Write},
};

use arbitrary::{Arbitrary, Unstructured};
use bitcoin::{BlockHash, Script, ScriptBuf, Txid, hashes::Hash, script::Instruction};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{amount::BitcoinAmount, constants::MAX_EXPOSED_TX_ELEMENTS};

/// Reference to a single transaction output.
///
/// Also used as the pointer to the UTXO currently holding aggregate custody.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtxoPointer {
    pub txid: Txid,
    pub vout: u32,
}

impl UtxoPointer {
    pub const fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for UtxoPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl BorshSerialize for UtxoPointer {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.txid.as_byte_array())?;
        BorshSerialize::serialize(&self.vout, writer)
    }
}

impl BorshDeserialize for UtxoPointer {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut txid = [0u8; 32];
        reader.read_exact(&mut txid)?;
        let vout = u32::deserialize_reader(reader)?;
        Ok(Self::new(Txid::from_byte_array(txid), vout))
    }
}

impl<'a> Arbitrary<'a> for UtxoPointer {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let txid = Txid::from_byte_array(<[u8; 32]>::arbitrary(u)?);
        // Keep indexes within what a transaction can realistically expose.
        let vout = u.int_in_range(0..=(MAX_EXPOSED_TX_ELEMENTS as u32 - 1))?;
        Ok(Self::new(txid, vout))
    }
}

/// Back-reference from a consumed output to the input that consumed it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRef {
    pub spending_txid: Txid,
    pub input_index: u32,
}

/// A transaction input, annotated by the oracle with the value it spends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Value of the output being spent.
    pub value: BitcoinAmount,

    /// The output being spent.
    pub prev_out: UtxoPointer,

    #[serde(default)]
    pub script_sig: ScriptBuf,

    #[serde(default = "default_sequence")]
    pub sequence: u32,

    /// Whether `script_sig` was served in full.
    #[serde(default = "default_true")]
    pub script_complete: bool,
}

impl TxInput {
    pub fn new(prev_out: UtxoPointer, value: BitcoinAmount) -> Self {
        Self {
            value,
            prev_out,
            script_sig: ScriptBuf::new(),
            sequence: default_sequence(),
            script_complete: true,
        }
    }

    /// Whether this input spends exactly `target`.
    pub fn spends(&self, target: &UtxoPointer) -> bool {
        self.prev_out == *target
    }
}

/// A transaction output with its OP_RETURN payload pre-extracted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: BitcoinAmount,

    pub script_pubkey: ScriptBuf,

    pub is_op_return: bool,

    /// Bytes of the first push after `OP_RETURN`, empty for other outputs.
    #[serde(default, with = "hex::serde")]
    pub op_return_data: Vec<u8>,

    #[serde(default)]
    pub spent_by: Option<SpendRef>,
}

impl TxOutput {
    /// Builds an output the way the oracle parses it from the raw script.
    pub fn from_script(value: BitcoinAmount, script_pubkey: ScriptBuf) -> Self {
        let is_op_return = script_pubkey.is_op_return();
        let op_return_data = if is_op_return {
            op_return_payload(&script_pubkey).unwrap_or_default()
        } else {
            Vec::new()
        };

        Self {
            value,
            script_pubkey,
            is_op_return,
            op_return_data,
            spent_by: None,
        }
    }
}

/// Extracts the data pushed right after `OP_RETURN`.
fn op_return_payload(script: &Script) -> Option<Vec<u8>> {
    let mut instructions = script.instructions().skip(1);
    match instructions.next()? {
        Ok(Instruction::PushBytes(bytes)) => Some(bytes.as_bytes().to_vec()),
        _ => None,
    }
}

/// A transaction as exposed by the oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinTransaction {
    pub txid: Txid,

    /// Block containing the transaction, if confirmed.
    #[serde(default)]
    pub block_hash: Option<BlockHash>,

    #[serde(default)]
    pub version: i32,

    #[serde(default)]
    pub size: u32,

    #[serde(default)]
    pub vsize: u32,

    #[serde(default)]
    pub lock_time: u32,

    /// Exposed prefix of the inputs.
    pub inputs: Vec<TxInput>,

    /// Exposed prefix of the outputs.
    pub outputs: Vec<TxOutput>,

    /// Declared number of inputs, including the ones not exposed.
    pub total_inputs: u32,

    /// Declared number of outputs, including the ones not exposed.
    pub total_outputs: u32,

    pub inputs_complete: bool,

    pub outputs_complete: bool,
}

impl BitcoinTransaction {
    /// Builds the oracle view of a transaction from its full input and output lists, exposing
    /// only the first [`MAX_EXPOSED_TX_ELEMENTS`] of each.
    pub fn from_full(txid: Txid, mut inputs: Vec<TxInput>, mut outputs: Vec<TxOutput>) -> Self {
        let total_inputs = inputs.len() as u32;
        let total_outputs = outputs.len() as u32;
        inputs.truncate(MAX_EXPOSED_TX_ELEMENTS);
        outputs.truncate(MAX_EXPOSED_TX_ELEMENTS);

        Self {
            txid,
            block_hash: None,
            version: 2,
            size: 0,
            vsize: 0,
            lock_time: 0,
            inputs_complete: inputs.len() as u32 == total_inputs,
            outputs_complete: outputs.len() as u32 == total_outputs,
            inputs,
            outputs,
            total_inputs,
            total_outputs,
        }
    }

    pub fn total_inputs(&self) -> usize {
        self.total_inputs as usize
    }

    pub fn total_outputs(&self) -> usize {
        self.total_outputs as usize
    }

    /// Exposed output at `idx`, if any.
    pub fn output(&self, idx: usize) -> Option<&TxOutput> {
        self.outputs.get(idx)
    }

    /// Number of declared outputs that are not OP_RETURN.
    ///
    /// Only meaningful when every output is exposed.
    pub fn value_output_count(&self) -> usize {
        self.outputs.iter().filter(|o| !o.is_op_return).count()
    }
}

fn default_sequence() -> u32 {
    u32::MAX
}

fn default_true() -> bool {
    true
}
