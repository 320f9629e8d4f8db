//! Script comparison and depositor extraction.

use bitcoin::Script;
use sha2::{Digest, Sha256};
use tunnel_primitives::{Buf32, EvmAddress, ScriptHash, TxOutput};

/// Length of an address written as ASCII hex without a prefix.
const HEX_ADDRESS_LEN: usize = EvmAddress::LEN * 2;

/// Hash used for every script equality check.
pub fn script_hash(script: &Script) -> ScriptHash {
    Buf32::new(Sha256::digest(script.as_bytes()).into())
}

/// Extracts an EVM address from an OP_RETURN payload.
///
/// Accepts exactly 20 raw bytes, or exactly 40 ASCII hex characters in any case. Anything else,
/// including a `0x`-prefixed string, yields `None`.
pub fn extract_evm_address(payload: &[u8]) -> Option<EvmAddress> {
    if payload.len() == EvmAddress::LEN {
        return EvmAddress::try_from(payload).ok();
    }

    if payload.len() == HEX_ADDRESS_LEN {
        let mut raw = [0u8; EvmAddress::LEN];
        hex::decode_to_slice(payload, &mut raw).ok()?;
        return Some(EvmAddress::new(raw));
    }

    None
}

/// Depositor named by `output`, if it is an OP_RETURN carrying an address.
pub(crate) fn output_depositor(output: &TxOutput) -> Option<EvmAddress> {
    if !output.is_op_return {
        return None;
    }
    extract_evm_address(&output.op_return_data)
}
