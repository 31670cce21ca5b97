//! Script and signing constants

/// Sign all inputs and all outputs
pub const SIGHASH_ALL: u8 = 0x01;

/// Sign all inputs and no outputs
pub const SIGHASH_NONE: u8 = 0x02;

/// Sign all inputs and the output at the same index
pub const SIGHASH_SINGLE: u8 = 0x03;

/// Replay-protected digest flag
pub const SIGHASH_FORKID: u8 = 0x40;

/// Sign only the current input
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// Sighash applied when the caller does not name one: ALL | FORKID
pub const DEFAULT_SIGHASH_TYPE: u8 = SIGHASH_ALL | SIGHASH_FORKID;

/// Largest payload pushed with a single length opcode
pub const MAX_DIRECT_PUSH: usize = 75;

/// Largest payload pushed with OP_PUSHDATA1
pub const MAX_PUSHDATA1: usize = 0xff;

/// Largest payload pushed with OP_PUSHDATA2
pub const MAX_PUSHDATA2: usize = 0xffff;

/// Length of a HASH160 digest
pub const HASH160_SIZE: usize = 20;
