//! Script opcodes emitted by the escrow generators
//!
//! Push opcodes (OP_0, the direct length bytes and OP_PUSHDATA1/2/4) are not
//! listed here: the script serializer owns those and picks the minimal form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single non-push instruction of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opcode(u8);

/// OP_0 - Push empty array
pub const OP_0: u8 = 0x00;
/// OP_PUSHDATA1 - Next byte is the data length
pub const OP_PUSHDATA1: u8 = 0x4c;
/// OP_PUSHDATA2 - Next 2 bytes (little-endian) are the data length
pub const OP_PUSHDATA2: u8 = 0x4d;
/// OP_PUSHDATA4 - Next 4 bytes (little-endian) are the data length
pub const OP_PUSHDATA4: u8 = 0x4e;

pub const OP_1NEGATE: Opcode = Opcode(0x4f);
pub const OP_1: Opcode = Opcode(0x51);
pub const OP_16: Opcode = Opcode(0x60);

// Flow control
pub const OP_NOP: Opcode = Opcode(0x61);
pub const OP_IF: Opcode = Opcode(0x63);
pub const OP_NOTIF: Opcode = Opcode(0x64);
pub const OP_ELSE: Opcode = Opcode(0x67);
pub const OP_ENDIF: Opcode = Opcode(0x68);
pub const OP_VERIFY: Opcode = Opcode(0x69);
pub const OP_RETURN: Opcode = Opcode(0x6a);

// Stack
pub const OP_TOALTSTACK: Opcode = Opcode(0x6b);
pub const OP_FROMALTSTACK: Opcode = Opcode(0x6c);
pub const OP_2DROP: Opcode = Opcode(0x6d);
pub const OP_2DUP: Opcode = Opcode(0x6e);
pub const OP_DEPTH: Opcode = Opcode(0x74);
pub const OP_DROP: Opcode = Opcode(0x75);
pub const OP_DUP: Opcode = Opcode(0x76);
pub const OP_NIP: Opcode = Opcode(0x77);
pub const OP_OVER: Opcode = Opcode(0x78);
pub const OP_PICK: Opcode = Opcode(0x79);
pub const OP_ROLL: Opcode = Opcode(0x7a);
pub const OP_ROT: Opcode = Opcode(0x7b);
pub const OP_SWAP: Opcode = Opcode(0x7c);
pub const OP_TUCK: Opcode = Opcode(0x7d);

// Splice
pub const OP_CAT: Opcode = Opcode(0x7e);
pub const OP_SPLIT: Opcode = Opcode(0x7f);
pub const OP_SIZE: Opcode = Opcode(0x82);

// Bitwise logic
pub const OP_EQUAL: Opcode = Opcode(0x87);
pub const OP_EQUALVERIFY: Opcode = Opcode(0x88);

// Arithmetic
pub const OP_NOT: Opcode = Opcode(0x91);
pub const OP_DIV: Opcode = Opcode(0x96);
pub const OP_MOD: Opcode = Opcode(0x97);

// Crypto
pub const OP_SHA256: Opcode = Opcode(0xa8);
pub const OP_HASH160: Opcode = Opcode(0xa9);
pub const OP_HASH256: Opcode = Opcode(0xaa);
pub const OP_CHECKSIG: Opcode = Opcode(0xac);
pub const OP_CHECKSIGVERIFY: Opcode = Opcode(0xad);
pub const OP_CHECKDATASIG: Opcode = Opcode(0xba);
pub const OP_CHECKDATASIGVERIFY: Opcode = Opcode(0xbb);

impl Opcode {
    /// Wrap a raw byte. Push opcodes (0x00..=0x4e) are rejected.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        if byte <= OP_PUSHDATA4 {
            None
        } else {
            Some(Opcode(byte))
        }
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Value of OP_1..OP_16, if this is one of them.
    pub fn small_int(self) -> Option<u8> {
        if (OP_1.0..=OP_16.0).contains(&self.0) {
            Some(self.0 - OP_1.0 + 1)
        } else {
            None
        }
    }

    /// Mnemonic for the opcode, `None` for bytes this crate does not name.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            OP_1NEGATE => "OP_1NEGATE",
            OP_NOP => "OP_NOP",
            OP_IF => "OP_IF",
            OP_NOTIF => "OP_NOTIF",
            OP_ELSE => "OP_ELSE",
            OP_ENDIF => "OP_ENDIF",
            OP_VERIFY => "OP_VERIFY",
            OP_RETURN => "OP_RETURN",
            OP_TOALTSTACK => "OP_TOALTSTACK",
            OP_FROMALTSTACK => "OP_FROMALTSTACK",
            OP_2DROP => "OP_2DROP",
            OP_2DUP => "OP_2DUP",
            OP_DEPTH => "OP_DEPTH",
            OP_DROP => "OP_DROP",
            OP_DUP => "OP_DUP",
            OP_NIP => "OP_NIP",
            OP_OVER => "OP_OVER",
            OP_PICK => "OP_PICK",
            OP_ROLL => "OP_ROLL",
            OP_ROT => "OP_ROT",
            OP_SWAP => "OP_SWAP",
            OP_TUCK => "OP_TUCK",
            OP_CAT => "OP_CAT",
            OP_SPLIT => "OP_SPLIT",
            OP_SIZE => "OP_SIZE",
            OP_EQUAL => "OP_EQUAL",
            OP_EQUALVERIFY => "OP_EQUALVERIFY",
            OP_NOT => "OP_NOT",
            OP_DIV => "OP_DIV",
            OP_MOD => "OP_MOD",
            OP_SHA256 => "OP_SHA256",
            OP_HASH160 => "OP_HASH160",
            OP_HASH256 => "OP_HASH256",
            OP_CHECKSIG => "OP_CHECKSIG",
            OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
            OP_CHECKDATASIG => "OP_CHECKDATASIG",
            OP_CHECKDATASIGVERIFY => "OP_CHECKDATASIGVERIFY",
            _ => return None,
        };
        Some(name)
    }
}

/// Small integers render as their value, named opcodes by mnemonic and
/// anything else as a hex byte.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.small_int() {
            return write!(f, "{}", n);
        }
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte_rejects_push_range() {
        assert_eq!(Opcode::from_byte(0x00), None);
        assert_eq!(Opcode::from_byte(0x14), None);
        assert_eq!(Opcode::from_byte(OP_PUSHDATA4), None);
        assert_eq!(Opcode::from_byte(0x76), Some(OP_DUP));
    }

    #[test]
    fn test_small_int_rendering() {
        assert_eq!(OP_1.to_string(), "1");
        assert_eq!(OP_16.to_string(), "16");
        assert_eq!(Opcode::from_byte(0x55).unwrap().to_string(), "5");
        assert_eq!(OP_DUP.small_int(), None);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(OP_CHECKDATASIGVERIFY.to_string(), "OP_CHECKDATASIGVERIFY");
        assert_eq!(OP_2DROP.to_string(), "OP_2DROP");
        assert_eq!(Opcode::from_byte(0xfe).unwrap().to_string(), "0xfe");
    }
}
