//! Escrow redeem script assembly
//!
//! ```text
//! OP_DUP OP_HASH160 <reclaim key hash> OP_EQUAL
//! OP_IF
//!     OP_CHECKSIG
//! OP_ELSE
//!     <input key validation>
//!     OP_OVER <4> OP_PICK OP_EQUAL OP_NOT OP_VERIFY
//!     OP_DUP OP_TOALTSTACK OP_CHECKDATASIGVERIFY OP_FROMALTSTACK OP_CHECKDATASIG
//! OP_ENDIF
//! ```
//!
//! The reclaim branch is a plain signature check. The escrow branch proves
//! the candidate key belongs to the input key set, refuses two identical
//! externally supplied messages, then checks two data signatures. The
//! message content is opaque to this crate.

use crate::error::Result;
use crate::hash::hash160;
use crate::opcodes::*;
use crate::script::Script;
use crate::validation::input_key_validation_script;
use log::debug;
use secp256k1::PublicKey;

/// Full redeem script for an escrow controlled by `input_public_keys` with
/// `reclaim_public_key` as the unilateral recovery key.
pub fn build_redeem_script(
    input_public_keys: &[PublicKey],
    reclaim_public_key: &PublicKey,
) -> Result<Script> {
    let script = reclaim_branch_check(reclaim_public_key)
        .append(input_key_validation_script(input_public_keys)?)
        .append(uniqueness_guard())
        .append(dual_signature_check());

    debug!(
        "Assembled escrow redeem script: {} input keys, {} elements",
        input_public_keys.len(),
        script.len()
    );
    Ok(script)
}

/// Opens the two-way branch; the reclaim side is completed with OP_CHECKSIG.
fn reclaim_branch_check(reclaim_public_key: &PublicKey) -> Script {
    Script::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(&hash160(&reclaim_public_key.serialize()))
        .push_opcode(OP_EQUAL)
        .push_opcode(OP_IF)
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_ELSE)
}

/// Fails when the second item equals the item four deep.
fn uniqueness_guard() -> Script {
    Script::new()
        .push_opcode(OP_OVER)
        .push_number(4)
        .push_opcode(OP_PICK)
        .push_opcode(OP_EQUAL)
        .push_opcode(OP_NOT)
        .push_opcode(OP_VERIFY)
}

/// Checks two data signatures against the same key and closes the branch.
fn dual_signature_check() -> Script {
    Script::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_TOALTSTACK)
        .push_opcode(OP_CHECKDATASIGVERIFY)
        .push_opcode(OP_FROMALTSTACK)
        .push_opcode(OP_CHECKDATASIG)
        .push_opcode(OP_ENDIF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptElement;
    use secp256k1::{Secp256k1, SecretKey};

    fn key(i: u8) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[i; 32]).unwrap())
    }

    #[test]
    fn test_branch_structure() {
        let script = build_redeem_script(&[key(1), key(2)], &key(9)).unwrap();
        let ops: Vec<Opcode> = script
            .elements()
            .iter()
            .filter_map(|e| match e {
                ScriptElement::Op(op) => Some(*op),
                ScriptElement::Push(_) => None,
            })
            .collect();

        let count = |target: Opcode| ops.iter().filter(|op| **op == target).count();
        assert_eq!(count(OP_IF), 1);
        assert_eq!(count(OP_ELSE), 1);
        assert_eq!(count(OP_ENDIF), 1);
        assert_eq!(count(OP_NOTIF), 0);
        assert_eq!(ops.last(), Some(&OP_ENDIF));
    }

    #[test]
    fn test_single_key_redeem_asm() {
        let reclaim = key(9);
        let input = key(1);
        let asm = build_redeem_script(&[input], &reclaim).unwrap().to_asm();
        let expected = format!(
            "OP_DUP OP_HASH160 20 0x{} OP_EQUAL OP_IF OP_CHECKSIG OP_ELSE \
             OP_DUP OP_HASH160 20 0x{} OP_EQUALVERIFY \
             OP_OVER 1 0x04 OP_PICK OP_EQUAL OP_NOT OP_VERIFY \
             OP_DUP OP_TOALTSTACK OP_CHECKDATASIGVERIFY OP_FROMALTSTACK OP_CHECKDATASIG OP_ENDIF",
            hex::encode(hash160(&reclaim.serialize())),
            hex::encode(hash160(&input.serialize()))
        );
        assert_eq!(asm, expected);
    }

    #[test]
    fn test_redeem_script_is_deterministic() {
        let keys: Vec<PublicKey> = (1..=6).map(key).collect();
        let first = build_redeem_script(&keys, &key(42)).unwrap();
        let second = build_redeem_script(&keys, &key(42)).unwrap();
        assert_eq!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
    }
}
