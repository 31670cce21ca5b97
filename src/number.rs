//! Minimal-width integer operands
//!
//! Numeric operands in escrow scripts are pushed as raw data rather than
//! small-integer opcodes. The encoding is the big-endian byte form of the
//! value with leading zero bytes stripped, so zero encodes to the empty byte
//! string. That empty string doubles as the Merkle padding leaf.

use crate::types::ByteString;

/// Encode `n` as its shortest big-endian byte string. Zero is empty.
pub fn encode_number(n: u64) -> ByteString {
    let bytes = n.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_empty() {
        assert!(encode_number(0).is_empty());
    }

    #[test]
    fn test_single_nibble_is_padded() {
        assert_eq!(encode_number(2), vec![0x02]);
        assert_eq!(encode_number(0x0f), vec![0x0f]);
    }

    #[test]
    fn test_full_byte() {
        assert_eq!(encode_number(0xff), vec![0xff]);
        assert_eq!(encode_number(0x80), vec![0x80]);
    }

    #[test]
    fn test_odd_nibble_count_above_one_byte() {
        assert_eq!(encode_number(0x100), vec![0x01, 0x00]);
        assert_eq!(encode_number(0xabc), vec![0x0a, 0xbc]);
    }

    #[test]
    fn test_big_endian_order() {
        assert_eq!(encode_number(0x0102_0304), vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(encode_number(u64::MAX), vec![0xff; 8]);
    }
}
