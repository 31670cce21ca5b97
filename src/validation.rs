//! Input public key validation scripts
//!
//! Each generator emits the bytecode that proves the candidate key on top of
//! the stack belongs to the escrow agent set. The strategy is picked by the
//! size of the set alone:
//!
//! | keys | strategy |
//! |------|----------|
//! | 1    | compare against the single key hash |
//! | 2-3  | list of key hashes, selected with `OP_ROLL` |
//! | 4+   | Merkle proof against a committed root |
//!
//! Every strategy leaves the candidate key on top of the stack.

use crate::error::{EscrowError, Result};
use crate::hash::hash160;
use crate::merkle::{build_root, num_levels};
use crate::opcodes::*;
use crate::script::Script;
use log::{debug, trace};
use secp256k1::PublicKey;

/// How set membership is proven for a given number of input keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStrategy {
    SingleKey,
    ListBased,
    MerkleProof,
}

impl ValidationStrategy {
    /// Strategy for a set of `key_count` keys; `None` for an empty set.
    pub fn for_key_count(key_count: usize) -> Option<Self> {
        match key_count {
            0 => None,
            1 => Some(ValidationStrategy::SingleKey),
            2 | 3 => Some(ValidationStrategy::ListBased),
            _ => Some(ValidationStrategy::MerkleProof),
        }
    }
}

/// Validation script for the given input key set.
pub fn input_key_validation_script(input_public_keys: &[PublicKey]) -> Result<Script> {
    let strategy =
        ValidationStrategy::for_key_count(input_public_keys.len()).ok_or(EscrowError::EmptyKeySet)?;
    debug!(
        "Generating {:?} validation for {} input keys",
        strategy,
        input_public_keys.len()
    );
    match strategy {
        ValidationStrategy::SingleKey => Ok(single_key_script(&input_public_keys[0])),
        ValidationStrategy::ListBased => Ok(list_based_script(input_public_keys)),
        ValidationStrategy::MerkleProof => merkle_proof_script(input_public_keys),
    }
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY`
fn single_key_script(input_public_key: &PublicKey) -> Script {
    Script::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(&hash160(&input_public_key.serialize()))
        .push_opcode(OP_EQUALVERIFY)
}

/// Expects `<key> <index>` on the stack. The index goes to the alt stack,
/// the key hash is computed, and the key hashes are pushed in caller order.
/// `OP_ROLL` by the index brings the selected literal to the top, then
/// `<n> OP_ROLL` brings the computed hash up beside it for comparison. The
/// remaining `n - 1` literals are dropped.
fn list_based_script(input_public_keys: &[PublicKey]) -> Script {
    let key_count = input_public_keys.len();
    let drop_opcode = if key_count == 3 { OP_2DROP } else { OP_DROP };

    let mut script = Script::new()
        .push_opcode(OP_TOALTSTACK)
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160);
    for key in input_public_keys {
        script = script.push_slice(&hash160(&key.serialize()));
    }
    script
        .push_opcode(OP_FROMALTSTACK)
        .push_opcode(OP_ROLL)
        .push_number(key_count as u64)
        .push_opcode(OP_ROLL)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(drop_opcode)
}

/// Expects `<key> <leaf index> <sibling L> .. <sibling 1>` on the stack.
///
/// The key is picked from depth `L + 1` and hashed. Level `i` then picks the
/// leaf index from depth `L + 1 - i` (rolled off on the last level), divides
/// it by `2^i`, and swaps the running hash under its sibling when the local
/// index is even, so `OP_CAT` always yields `left || right`.
fn merkle_proof_script(input_public_keys: &[PublicKey]) -> Result<Script> {
    let levels = num_levels(input_public_keys.len());
    let root = build_root(input_public_keys)?;

    let mut script = Script::new()
        .push_number(levels as u64 + 1)
        .push_opcode(OP_PICK)
        .push_opcode(OP_HASH160);

    for level in 0..levels {
        let index_depth = (levels + 1 - level) as u64;
        let index_opcode = if level == levels - 1 { OP_ROLL } else { OP_PICK };
        trace!(
            "Merkle level {}: index depth {}, {}",
            level,
            index_depth,
            index_opcode
        );

        script = script.push_number(index_depth).push_opcode(index_opcode);
        if level > 0 {
            script = script.push_number(1u64 << level).push_opcode(OP_DIV);
        }
        script = script
            .push_number(2)
            .push_opcode(OP_MOD)
            .push_opcode(OP_NOTIF)
            .push_opcode(OP_SWAP)
            .push_opcode(OP_ENDIF)
            .push_opcode(OP_CAT)
            .push_opcode(OP_HASH160);
    }

    Ok(script.push_slice(&root).push_opcode(OP_EQUALVERIFY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    fn test_keys(count: u8) -> Vec<PublicKey> {
        let secp = Secp256k1::new();
        (1..=count)
            .map(|i| PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[i; 32]).unwrap()))
            .collect()
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(ValidationStrategy::for_key_count(0), None);
        assert_eq!(ValidationStrategy::for_key_count(1), Some(ValidationStrategy::SingleKey));
        assert_eq!(ValidationStrategy::for_key_count(2), Some(ValidationStrategy::ListBased));
        assert_eq!(ValidationStrategy::for_key_count(3), Some(ValidationStrategy::ListBased));
        assert_eq!(ValidationStrategy::for_key_count(4), Some(ValidationStrategy::MerkleProof));
        assert_eq!(ValidationStrategy::for_key_count(100), Some(ValidationStrategy::MerkleProof));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(matches!(input_key_validation_script(&[]), Err(EscrowError::EmptyKeySet)));
    }

    #[test]
    fn test_list_keeps_caller_order() {
        let keys = test_keys(2);
        let forward = input_key_validation_script(&keys).unwrap();
        let backward = input_key_validation_script(&[keys[1], keys[0]]).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_merkle_ignores_caller_order() {
        let keys = test_keys(5);
        let mut shuffled = keys.clone();
        shuffled.swap(0, 4);
        shuffled.swap(1, 3);
        assert_eq!(
            input_key_validation_script(&keys).unwrap(),
            input_key_validation_script(&shuffled).unwrap()
        );
    }

    #[test]
    fn test_merkle_four_keys_layout() {
        let keys = test_keys(4);
        let root = build_root(&keys).unwrap();
        let asm = input_key_validation_script(&keys).unwrap().to_asm();

        let expected = format!(
            "1 0x03 OP_PICK OP_HASH160 \
             1 0x03 OP_PICK 1 0x02 OP_MOD OP_NOTIF OP_SWAP OP_ENDIF OP_CAT OP_HASH160 \
             1 0x02 OP_ROLL 1 0x02 OP_DIV 1 0x02 OP_MOD OP_NOTIF OP_SWAP OP_ENDIF OP_CAT OP_HASH160 \
             20 0x{} OP_EQUALVERIFY",
            hex::encode(root)
        );
        assert_eq!(asm, expected);
    }

    #[test]
    fn test_merkle_level_count_matches_tree() {
        for count in 4..=9u8 {
            let keys = test_keys(count);
            let script = input_key_validation_script(&keys).unwrap();
            let cats = script
                .elements()
                .iter()
                .filter(|e| **e == crate::script::ScriptElement::Op(OP_CAT))
                .count();
            assert_eq!(cats, num_levels(keys.len()));
        }
    }
}
