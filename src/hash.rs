//! Hash primitives used by scripts and signatures

use crate::types::{Hash, Hash160};
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// HASH160: RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripemd160_hash);
    hash
}

/// HASH256: SHA256(SHA256(x))
pub fn sha256d(data: &[u8]) -> Hash {
    let mut hasher = sha256d::Hash::engine();
    hasher.input(data);
    sha256d::Hash::from_engine(hasher).into_inner()
}
