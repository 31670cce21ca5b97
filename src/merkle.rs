//! Merkle tree over escrow agent public keys
//!
//! Keys are sorted by their hex encoding, padded on the right with empty
//! leaves up to the next power of two and hashed with HASH160. Each parent is
//! `HASH160(left || right)`. Only the root is kept; intermediate levels are
//! folded in place and discarded.

use crate::constants::HASH160_SIZE;
use crate::error::{EscrowError, Result};
use crate::hash::hash160;
use crate::number::encode_number;
use crate::types::{ByteString, Hash160};
use log::debug;
use secp256k1::PublicKey;

/// Number of tree levels for `key_count` leaves: ceil(log2(key_count)).
pub fn num_levels(key_count: usize) -> usize {
    if key_count <= 1 {
        0
    } else {
        (usize::BITS - (key_count - 1).leading_zeros()) as usize
    }
}

/// Keys in canonical order (ascending hex encoding).
pub fn sorted_keys(keys: &[PublicKey]) -> Vec<PublicKey> {
    let mut sorted = keys.to_vec();
    sorted.sort_by_cached_key(|key| hex::encode(key.serialize()));
    sorted
}

/// Leaf hashes of the canonical, padded key list.
pub fn leaf_hashes(keys: &[PublicKey]) -> Result<Vec<Hash160>> {
    if keys.is_empty() {
        return Err(EscrowError::EmptyKeySet);
    }
    let capacity = 1usize << num_levels(keys.len());
    let padding_leaf = hash160(&encode_number(0));

    let mut leaves: Vec<Hash160> = sorted_keys(keys)
        .iter()
        .map(|key| hash160(&key.serialize()))
        .collect();
    leaves.resize(capacity, padding_leaf);
    Ok(leaves)
}

/// Fold a list of hashes down to its root. The list length must be a power
/// of two.
pub fn merkle_root(hashes: &[Hash160]) -> Result<Hash160> {
    if hashes.is_empty() {
        return Err(EscrowError::EmptyKeySet);
    }
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        fold_level(&mut level)?;
    }
    Ok(level[0])
}

/// Merkle root over a set of public keys. Independent of input order.
pub fn build_root(keys: &[PublicKey]) -> Result<Hash160> {
    let root = merkle_root(&leaf_hashes(keys)?)?;
    debug!(
        "Merkle root over {} keys ({} levels): {}",
        keys.len(),
        num_levels(keys.len()),
        hex::encode(root)
    );
    Ok(root)
}

fn parent_hash(left: &Hash160, right: &Hash160) -> Hash160 {
    let mut combined = [0u8; 2 * HASH160_SIZE];
    combined[..HASH160_SIZE].copy_from_slice(left);
    combined[HASH160_SIZE..].copy_from_slice(right);
    hash160(&combined)
}

/// Replace `level` with its parent level, halving its length.
fn fold_level(level: &mut Vec<Hash160>) -> Result<()> {
    if level.len() % 2 != 0 {
        return Err(EscrowError::UnbalancedTree(level.len()));
    }
    let half = level.len() / 2;
    for i in 0..half {
        level[i] = parent_hash(&level[2 * i], &level[2 * i + 1]);
    }
    level.truncate(half);
    Ok(())
}

/// Membership proof for one key: its position in the canonical leaf list and
/// the sibling hash at every level, leaf level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf_index: u64,
    pub siblings: Vec<Hash160>,
}

/// Build the membership proof for `key`, or `None` if it is not in `keys`.
pub fn proof_for(keys: &[PublicKey], key: &PublicKey) -> Result<Option<MerkleProof>> {
    let position = match sorted_keys(keys).iter().position(|candidate| candidate == key) {
        Some(position) => position,
        None => return Ok(None),
    };

    let mut level = leaf_hashes(keys)?;
    let mut index = position;
    let mut siblings = Vec::with_capacity(num_levels(keys.len()));
    while level.len() > 1 {
        siblings.push(level[index ^ 1]);
        fold_level(&mut level)?;
        index /= 2;
    }

    Ok(Some(MerkleProof {
        leaf_index: position as u64,
        siblings,
    }))
}

impl MerkleProof {
    /// Recompute the root the way the proof script does: at level `i` the
    /// running hash is the left child iff `(leaf_index / 2^i) % 2 == 0`.
    pub fn verify(&self, root: &Hash160, key: &PublicKey) -> bool {
        let mut running = hash160(&key.serialize());
        for (level, sibling) in self.siblings.iter().enumerate() {
            let local_index = self.leaf_index.checked_shr(level as u32).unwrap_or(0);
            running = if local_index % 2 == 0 {
                parent_hash(&running, sibling)
            } else {
                parent_hash(sibling, &running)
            };
        }
        running == *root
    }

    /// Stack items the spender pushes ahead of the proof script, in push
    /// order: the candidate key, the leaf index, then the siblings from the
    /// top level down so the leaf-level sibling ends up on top.
    pub fn witness_elements(&self, key: &PublicKey) -> Vec<ByteString> {
        let mut elements = Vec::with_capacity(self.siblings.len() + 2);
        elements.push(key.serialize().to_vec());
        elements.push(encode_number(self.leaf_index));
        elements.extend(self.siblings.iter().rev().map(|sibling| sibling.to_vec()));
        elements
    }
}
