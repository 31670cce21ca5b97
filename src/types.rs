//! Transaction types consumed by the escrow input

use crate::constants::HASH160_SIZE;
use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// HASH160 digest: RIPEMD160(SHA256(x))
pub type Hash160 = [u8; HASH160_SIZE];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type
pub type Integer = i64;

/// Reference to a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

/// Transaction input: outpoint, unlocking script and sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: Natural,
}

/// Transaction output: value and locking script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    /// Script hash committed to by a pay-to-script-hash locking script
    /// (`OP_HASH160 <20 bytes> OP_EQUAL`), if this output is one.
    pub fn script_hash(&self) -> Option<Hash160> {
        let spk = &self.script_pubkey;
        let end = HASH160_SIZE + 2;
        if spk.len() == end + 1
            && spk[0] == 0xa9
            && spk[1] == HASH160_SIZE as u8
            && spk[end] == 0x87
        {
            let mut hash = [0u8; HASH160_SIZE];
            hash.copy_from_slice(&spk[2..end]);
            Some(hash)
        } else {
            None
        }
    }
}

/// Transaction: version, inputs, outputs, lock time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: Natural,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: Natural,
}
