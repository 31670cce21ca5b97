//! # Escrow-Script
//!
//! Redeem script generation and spending for two-party escrow outputs.
//!
//! Funds are locked to the hash of a redeem script with two branches:
//! - **Reclaim**: the reclaim key holder spends unilaterally with a plain
//!   transaction signature.
//! - **Escrow**: a key from the escrow agent set proves membership (by direct
//!   comparison, a short list, or a Merkle proof) and two data signatures
//!   over an externally agreed message are checked.
//!
//! ## Architecture
//!
//! - `number`, `hash`, `opcodes`, `script`: operand encoding, digests and a
//!   typed script program with a single serializer
//! - `merkle`: Merkle tree over the sorted agent keys
//! - `validation`: membership proof bytecode for the agent set
//! - `redeem`: full redeem script assembly
//! - `sighash`, `signature`, `input`: signing, verification and unlocking
//!   script assembly for an escrow input
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: script generation is deterministic and side-effect-free
//! 2. **Byte-Exact Output**: scripts are compared byte for byte against fixed vectors
//! 3. **Exact Version Pinning**: all consensus-critical dependencies pinned to exact versions
//! 4. **No Script Execution**: scripts are emitted, never interpreted
//!
//! ## Usage
//!
//! ```rust
//! use escrow_script::redeem::build_redeem_script;
//! use secp256k1::{PublicKey, Secp256k1, SecretKey};
//!
//! let secp = Secp256k1::new();
//! let key = |i: u8| PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[i; 32]).unwrap());
//!
//! let agents = vec![key(1), key(2), key(3), key(4)];
//! let redeem_script = build_redeem_script(&agents, &key(9)).unwrap();
//! assert!(redeem_script.to_asm().starts_with("OP_DUP OP_HASH160 20 0x"));
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod hash;
pub mod number;
pub mod opcodes;
pub mod script;
pub mod merkle;
pub mod validation;
pub mod redeem;
pub mod sighash;
pub mod signature;
pub mod input;

// Re-export commonly used types
pub use types::*;
pub use error::{EscrowError, Result};
pub use script::{Script, ScriptElement};
pub use merkle::{build_root, MerkleProof};
pub use validation::{input_key_validation_script, ValidationStrategy};
pub use redeem::build_redeem_script;
pub use sighash::{SighashType, SigningMethod};
pub use signature::TransactionSignature;
pub use input::{EscrowInput, SignableInput};
