//! Transaction signature hashing, signing and verification
//!
//! The digest follows the BIP143 layout with the replay-protection flag
//! carried in the sighash type: the script code and the spent value are
//! committed directly, and the prevout, sequence and output sets are
//! committed as double-SHA256 hashes.

use crate::constants::*;
use crate::error::{EscrowError, Result};
use crate::hash::sha256d;
use crate::types::*;
use secp256k1::{ecdsa, schnorr, Keypair, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

/// Sighash flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(pub u8);

impl SighashType {
    pub fn to_u8(self) -> u8 {
        self.0
    }

    /// ALL, NONE or SINGLE with the modifier bits masked off
    pub fn base_type(self) -> u8 {
        self.0 & 0x1f
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    pub fn has_fork_id(self) -> bool {
        self.0 & SIGHASH_FORKID != 0
    }
}

impl Default for SighashType {
    fn default() -> Self {
        SighashType(DEFAULT_SIGHASH_TYPE)
    }
}

/// Signature scheme used for the transaction signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningMethod {
    /// DER-encoded ECDSA
    Ecdsa,
    /// 64-byte Schnorr over the key's x coordinate
    Schnorr,
}

/// Signature digest for spending `tx.inputs[input_index]`, whose previous
/// output holds `value` and is satisfied by `script_code`. The sighash type
/// must carry FORKID.
pub fn sighash_digest(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    value: Integer,
    sighash_type: SighashType,
) -> Result<Hash> {
    if !sighash_type.has_fork_id() {
        return Err(EscrowError::MissingForkId(sighash_type.to_u8()));
    }
    let input = tx.inputs.get(input_index).ok_or(EscrowError::InputIndexOutOfRange {
        index: input_index,
        inputs: tx.inputs.len(),
    })?;

    let mut preimage = Vec::new();
    preimage.extend_from_slice(&(tx.version as u32).to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts(tx, sighash_type));
    preimage.extend_from_slice(&hash_sequence(tx, sighash_type));

    preimage.extend_from_slice(&input.prevout.hash);
    preimage.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());

    preimage.extend_from_slice(&encode_varint(script_code.len() as u64));
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&(value as u64).to_le_bytes());
    preimage.extend_from_slice(&(input.sequence as u32).to_le_bytes());

    preimage.extend_from_slice(&hash_outputs(tx, input_index, sighash_type));
    preimage.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    preimage.extend_from_slice(&(sighash_type.to_u8() as u32).to_le_bytes());

    Ok(sha256d(&preimage))
}

/// Sign the input and return the raw signature bytes (no sighash byte).
pub fn sign(
    tx: &Transaction,
    private_key: &SecretKey,
    sighash_type: SighashType,
    input_index: usize,
    script_code: &[u8],
    value: Integer,
    signing_method: SigningMethod,
) -> Result<ByteString> {
    let digest = sighash_digest(tx, input_index, script_code, value, sighash_type)?;
    let message = Message::from_digest_slice(&digest)?;
    let secp = Secp256k1::new();

    let signature = match signing_method {
        SigningMethod::Ecdsa => secp.sign_ecdsa(&message, private_key).serialize_der().to_vec(),
        SigningMethod::Schnorr => {
            let keypair = Keypair::from_secret_key(&secp, private_key);
            secp.sign_schnorr_no_aux_rand(&message, &keypair)[..].to_vec()
        }
    };
    Ok(signature)
}

/// Check a raw signature over the input. Malformed signatures and digests
/// that cannot be computed verify as `false`.
#[allow(clippy::too_many_arguments)]
pub fn verify(
    tx: &Transaction,
    signature: &[u8],
    public_key: &PublicKey,
    sighash_type: SighashType,
    input_index: usize,
    script_code: &[u8],
    value: Integer,
    signing_method: SigningMethod,
) -> bool {
    let digest = match sighash_digest(tx, input_index, script_code, value, sighash_type) {
        Ok(digest) => digest,
        Err(_) => return false,
    };
    let message = match Message::from_digest_slice(&digest) {
        Ok(message) => message,
        Err(_) => return false,
    };
    let secp = Secp256k1::verification_only();

    match signing_method {
        SigningMethod::Ecdsa => match ecdsa::Signature::from_der(signature) {
            Ok(sig) => secp.verify_ecdsa(&message, &sig, public_key).is_ok(),
            Err(_) => false,
        },
        SigningMethod::Schnorr => match schnorr::Signature::from_slice(signature) {
            Ok(sig) => {
                let (x_only, _parity) = public_key.x_only_public_key();
                secp.verify_schnorr(&sig, &message, &x_only).is_ok()
            }
            Err(_) => false,
        },
    }
}

fn hash_prevouts(tx: &Transaction, sighash_type: SighashType) -> Hash {
    if sighash_type.anyone_can_pay() {
        return [0u8; 32];
    }
    let mut data = Vec::new();
    for input in &tx.inputs {
        data.extend_from_slice(&input.prevout.hash);
        data.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
    }
    sha256d(&data)
}

fn hash_sequence(tx: &Transaction, sighash_type: SighashType) -> Hash {
    if sighash_type.anyone_can_pay()
        || sighash_type.base_type() == SIGHASH_SINGLE
        || sighash_type.base_type() == SIGHASH_NONE
    {
        return [0u8; 32];
    }
    let mut data = Vec::new();
    for input in &tx.inputs {
        data.extend_from_slice(&(input.sequence as u32).to_le_bytes());
    }
    sha256d(&data)
}

fn hash_outputs(tx: &Transaction, input_index: usize, sighash_type: SighashType) -> Hash {
    let base = sighash_type.base_type();
    if base != SIGHASH_SINGLE && base != SIGHASH_NONE {
        let mut data = Vec::new();
        for output in &tx.outputs {
            write_output(&mut data, output);
        }
        sha256d(&data)
    } else if base == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        let mut data = Vec::new();
        write_output(&mut data, &tx.outputs[input_index]);
        sha256d(&data)
    } else {
        [0u8; 32]
    }
}

fn write_output(data: &mut Vec<u8>, output: &TransactionOutput) {
    data.extend_from_slice(&(output.value as u64).to_le_bytes());
    data.extend_from_slice(&encode_varint(output.script_pubkey.len() as u64));
    data.extend_from_slice(&output.script_pubkey);
}

/// Encode a number as a Bitcoin varint
fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tx() -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![
                TransactionInput {
                    prevout: OutPoint { hash: [1; 32], index: 0 },
                    script_sig: vec![],
                    sequence: 0xffffffff,
                },
                TransactionInput {
                    prevout: OutPoint { hash: [2; 32], index: 3 },
                    script_sig: vec![],
                    sequence: 0xfffffffe,
                },
            ],
            outputs: vec![TransactionOutput {
                value: 90_000,
                script_pubkey: vec![0x51],
            }],
            lock_time: 0,
        }
    }

    fn secret() -> SecretKey {
        SecretKey::from_slice(&[0x11; 32]).unwrap()
    }

    #[test]
    fn test_default_sighash_type() {
        let sighash = SighashType::default();
        assert_eq!(sighash.to_u8(), 0x41);
        assert_eq!(sighash.base_type(), SIGHASH_ALL);
        assert!(sighash.has_fork_id());
        assert!(!sighash.anyone_can_pay());
    }

    #[test]
    fn test_digest_depends_on_input_and_value() {
        let tx = test_tx();
        let script = [0x76, 0xa9];
        let sighash = SighashType::default();
        let base = sighash_digest(&tx, 0, &script, 100_000, sighash).unwrap();

        assert_ne!(sighash_digest(&tx, 1, &script, 100_000, sighash).unwrap(), base);
        assert_ne!(sighash_digest(&tx, 0, &script, 100_001, sighash).unwrap(), base);
        assert_ne!(sighash_digest(&tx, 0, &[0x76], 100_000, sighash).unwrap(), base);
    }

    #[test]
    fn test_digest_rejects_missing_input() {
        let tx = test_tx();
        assert!(matches!(
            sighash_digest(&tx, 2, &[], 0, SighashType::default()),
            Err(EscrowError::InputIndexOutOfRange { index: 2, inputs: 2 })
        ));
    }

    #[test]
    fn test_digest_requires_fork_id() {
        let tx = test_tx();
        assert!(matches!(
            sighash_digest(&tx, 0, &[], 0, SighashType(SIGHASH_ALL)),
            Err(EscrowError::MissingForkId(0x01))
        ));
        let legacy = SighashType(SIGHASH_ALL | SIGHASH_ANYONECANPAY);
        let result = sign(&tx, &secret(), legacy, 0, &[], 0, SigningMethod::Ecdsa);
        assert!(matches!(result, Err(EscrowError::MissingForkId(0x81))));
    }

    #[test]
    fn test_anyone_can_pay_ignores_other_inputs() {
        let mut tx = test_tx();
        let sighash = SighashType(SIGHASH_ALL | SIGHASH_FORKID | SIGHASH_ANYONECANPAY);
        let before = sighash_digest(&tx, 0, &[], 1000, sighash).unwrap();
        tx.inputs[1].prevout.index = 7;
        assert_eq!(sighash_digest(&tx, 0, &[], 1000, sighash).unwrap(), before);
    }

    #[test]
    fn test_ecdsa_sign_verify() {
        let tx = test_tx();
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret());
        let sighash = SighashType::default();

        let sig = sign(&tx, &secret(), sighash, 0, &[0xac], 5000, SigningMethod::Ecdsa).unwrap();
        assert!(verify(&tx, &sig, &public_key, sighash, 0, &[0xac], 5000, SigningMethod::Ecdsa));
        assert!(!verify(&tx, &sig, &public_key, sighash, 0, &[0xac], 5001, SigningMethod::Ecdsa));
        assert!(!verify(&tx, &sig, &public_key, sighash, 0, &[0xac], 5000, SigningMethod::Schnorr));
    }

    #[test]
    fn test_schnorr_sign_verify() {
        let tx = test_tx();
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret());
        let sighash = SighashType::default();

        let sig = sign(&tx, &secret(), sighash, 1, &[0xac], 5000, SigningMethod::Schnorr).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify(&tx, &sig, &public_key, sighash, 1, &[0xac], 5000, SigningMethod::Schnorr));
        assert!(!verify(&tx, &sig, &public_key, sighash, 0, &[0xac], 5000, SigningMethod::Schnorr));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let tx = test_tx();
        let sighash = SighashType::default();
        for method in [SigningMethod::Ecdsa, SigningMethod::Schnorr] {
            let first = sign(&tx, &secret(), sighash, 0, &[0xac], 5000, method).unwrap();
            let second = sign(&tx, &secret(), sighash, 0, &[0xac], 5000, method).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_varint() {
        assert_eq!(encode_varint(0xfc), vec![0xfc]);
        assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encode_varint(0x10000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }
}
