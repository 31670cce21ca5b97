//! Transaction signatures collected for an escrow input

use crate::error::Result;
use crate::sighash::SighashType;
use crate::types::*;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

/// A signature over one input of a transaction, together with the key and
/// sighash type it was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub public_key: PublicKey,
    pub prev_tx_id: Hash,
    pub output_index: Natural,
    pub input_index: usize,
    pub signature: ByteString,
    pub sighash_type: SighashType,
}

impl TransactionSignature {
    /// Signature as it appears in an unlocking script: the raw signature
    /// followed by the one-byte sighash type.
    pub fn to_script_bytes(&self) -> ByteString {
        let mut bytes = Vec::with_capacity(self.signature.len() + 1);
        bytes.extend_from_slice(&self.signature);
        bytes.push(self.sighash_type.to_u8());
        bytes
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}
