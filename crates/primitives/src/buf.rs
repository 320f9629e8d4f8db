//! Fixed-size byte buffers.

use thiserror::Error;

/// Error parsing a buffer from hex text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid hex buffer (expected {expected_len} bytes)")]
pub struct BufParseError {
    pub expected_len: usize,
}

/// A 20-byte buffer, the width of an EVM account address.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Buf20(pub [u8; 20]);
impl_buf!(Buf20, 20);

/// A 32-byte buffer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Buf32(pub [u8; 32]);
impl_buf!(Buf32, 32);

/// SHA-256 digest of a locking script, the unit of every script comparison.
pub type ScriptHash = Buf32;

/// Account on the EVM side of the tunnel credited by a deposit.
pub type EvmAddress = Buf20;

#[cfg(test)]
mod tests {
    use borsh::BorshDeserialize;
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_buf32_is_zero() {
        assert!(Buf32::zero().is_zero());
        let mut raw = [0u8; 32];
        raw[31] = 1;
        assert!(!Buf32::from(raw).is_zero());
    }

    #[test]
    fn test_buf20_parse_accepts_prefix_and_mixed_case() {
        let expected = Buf20::new(hex!("aaBBccDDeeff00112233445566778899aabbccdd"));
        let plain: Buf20 = "aabbccddeeff00112233445566778899aabbccdd".parse().unwrap();
        let prefixed: Buf20 = "0xAABBCCDDEEFF00112233445566778899AABBCCDD".parse().unwrap();
        assert_eq!(plain, expected);
        assert_eq!(prefixed, expected);
    }

    #[test]
    fn test_buf20_parse_rejects_wrong_length() {
        let err = "aabbcc".parse::<Buf20>().unwrap_err();
        assert_eq!(err.expected_len, 20);
    }

    #[test]
    fn test_buf32_display_is_truncated() {
        let buf = Buf32::new(hex!(
            "0102030000000000000000000000000000000000000000000000000000a0b0c0"
        ));
        assert_eq!(buf.to_string(), "010203..a0b0c0");
        assert_eq!(format!("{buf:?}").len(), 64);
    }

    #[test]
    fn test_buf32_json_is_hex_string() {
        let buf = Buf32::new([0xab; 32]);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let decoded: Buf32 = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, buf);
    }

    #[test]
    fn test_buf20_borsh_is_raw_bytes() {
        let buf = Buf20::new([7; 20]);
        let encoded = borsh::to_vec(&buf).unwrap();
        assert_eq!(encoded, vec![7; 20]);
        assert_eq!(Buf20::try_from_slice(&encoded).unwrap(), buf);
    }
}
