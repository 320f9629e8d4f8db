//! Withdrawal-index marker carried in an OP_RETURN output.
//!
//! The marker is `OP_RETURN <push> <payload>` where the first 4 payload bytes are the
//! big-endian withdrawal index. Payloads up to 75 bytes use a direct push opcode, longer ones
//! use `OP_PUSHDATA1 <len>`. Bytes past the first 4 are ignored.

use bitcoin::{
    Script, ScriptBuf,
    opcodes::all::{OP_PUSHBYTES_75, OP_PUSHDATA1, OP_RETURN},
};
use tunnel_primitives::constants::WITHDRAWAL_INDEX_LEN;

use crate::errors::OpReturnDecodeError;

/// Decodes the withdrawal index from an OP_RETURN script.
///
/// # Errors
///
/// - [`OpReturnDecodeError::NotOpReturn`] if the script does not start with `OP_RETURN`
/// - [`OpReturnDecodeError::UnsupportedPush`] if the payload is not pushed with a direct push or
///   `OP_PUSHDATA1`
/// - [`OpReturnDecodeError::ShortPayload`] if fewer than 4 payload bytes are declared or present
pub fn decode_withdrawal_index(script: &Script) -> Result<u32, OpReturnDecodeError> {
    let bytes = script.as_bytes();

    if bytes.first() != Some(&OP_RETURN.to_u8()) {
        return Err(OpReturnDecodeError::NotOpReturn);
    }

    let (declared, start) = match bytes.get(1).copied() {
        Some(op) if op <= OP_PUSHBYTES_75.to_u8() => (op as usize, 2),
        Some(op) if op == OP_PUSHDATA1.to_u8() => {
            let len = bytes.get(2).copied().unwrap_or(0);
            (len as usize, 3)
        }
        Some(op) => return Err(OpReturnDecodeError::UnsupportedPush(op)),
        None => {
            return Err(OpReturnDecodeError::ShortPayload {
                declared: 0,
                present: 0,
            });
        }
    };

    let present = bytes.len().saturating_sub(start);
    if declared < WITHDRAWAL_INDEX_LEN || present < WITHDRAWAL_INDEX_LEN {
        return Err(OpReturnDecodeError::ShortPayload { declared, present });
    }

    let mut index = [0u8; WITHDRAWAL_INDEX_LEN];
    index.copy_from_slice(&bytes[start..start + WITHDRAWAL_INDEX_LEN]);
    Ok(u32::from_be_bytes(index))
}

/// Builds the canonical 6-byte marker script for `index`.
pub fn withdrawal_marker_script(index: u32) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(2 + WITHDRAWAL_INDEX_LEN);
    bytes.push(OP_RETURN.to_u8());
    bytes.push(WITHDRAWAL_INDEX_LEN as u8);
    bytes.extend_from_slice(&index.to_be_bytes());
    ScriptBuf::from_bytes(bytes)
}
