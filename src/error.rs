//! Error types for escrow script generation and spending

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("At least one input public key is required")]
    EmptyKeySet,

    #[error("Merkle level has an unpaired node: {0} hashes")]
    UnbalancedTree(usize),

    #[error("Redeem script hash {actual} does not match funding output script hash {expected}")]
    RedeemScriptMismatch { expected: String, actual: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Expected at most one existing signature, got {0}")]
    TooManySignatures(usize),

    #[error("Input index {index} out of range for transaction with {inputs} inputs")]
    InputIndexOutOfRange { index: usize, inputs: usize },

    #[error("Sighash type 0x{0:02x} lacks the FORKID flag")]
    MissingForkId(u8),

    #[error("Push payload of {0} bytes exceeds the largest push form")]
    PushTooLarge(usize),

    #[error("Script parse failed: {0}")]
    ScriptParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

pub type Result<T> = std::result::Result<T, EscrowError>;
