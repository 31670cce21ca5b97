//! Escrow transaction input
//!
//! An [`EscrowInput`] spends a pay-to-script-hash output locked to an escrow
//! redeem script. The redeem script is derived once at construction and must
//! hash to the funding output's script hash. The input then carries at most
//! one signature: the reclaim key holder's signature over the redeem script.

use crate::error::{EscrowError, Result};
use crate::redeem::build_redeem_script;
use crate::script::{write_push, Script};
use crate::sighash::{self, SighashType, SigningMethod};
use crate::signature::TransactionSignature;
use crate::types::*;
use log::{debug, warn};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

/// Signing capability of a transaction input.
pub trait SignableInput {
    /// Produce this input's signatures for `private_key`. Keys that cannot
    /// sign this input yield an empty list.
    fn produce_signatures(
        &self,
        tx: &Transaction,
        private_key: &SecretKey,
        input_index: usize,
        sighash_type: Option<SighashType>,
        signing_method: SigningMethod,
    ) -> Result<Vec<TransactionSignature>>;

    /// Whether `signature` is a valid signature for this input.
    fn is_valid_signature(
        &self,
        tx: &Transaction,
        signature: &TransactionSignature,
        signing_method: SigningMethod,
    ) -> bool;

    /// Record a verified signature and set the unlocking script.
    fn add_signature(
        &mut self,
        tx: &Transaction,
        signature: TransactionSignature,
        signing_method: SigningMethod,
    ) -> Result<()>;

    /// Drop any recorded signature.
    fn clear_signatures(&mut self);

    fn is_fully_signed(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct EscrowInput {
    input: TransactionInput,
    output: TransactionOutput,
    input_public_keys: Vec<PublicKey>,
    reclaim_public_key: PublicKey,
    redeem_script: Script,
    signature: Option<TransactionSignature>,
}

impl EscrowInput {
    /// Build the escrow input spending `output` through `input`.
    ///
    /// Fails with [`EscrowError::RedeemScriptMismatch`] if the redeem script
    /// derived from the keys does not hash to the output's script hash.
    /// `existing_signatures` are previously exported signatures in JSON form;
    /// at most one is accepted, and it must come from the reclaim key for
    /// this input's outpoint. A restored signature rebuilds the unlocking
    /// script.
    pub fn new(
        input: TransactionInput,
        output: TransactionOutput,
        input_public_keys: Vec<PublicKey>,
        reclaim_public_key: PublicKey,
        existing_signatures: Option<&[serde_json::Value]>,
    ) -> Result<Self> {
        let redeem_script = build_redeem_script(&input_public_keys, &reclaim_public_key)?;
        let redeem_hash = redeem_script.hash160()?;

        match output.script_hash() {
            Some(expected) if expected == redeem_hash => {}
            expected => {
                let expected = expected
                    .map(hex::encode)
                    .unwrap_or_else(|| format!("<non-P2SH {}>", hex::encode(&output.script_pubkey)));
                warn!(
                    "Escrow keys hash to {} but funding output commits to {}",
                    hex::encode(redeem_hash),
                    expected
                );
                return Err(EscrowError::RedeemScriptMismatch {
                    expected,
                    actual: hex::encode(redeem_hash),
                });
            }
        }

        let restored = match existing_signatures.unwrap_or_default() {
            [] => None,
            [one] => Some(TransactionSignature::from_json(one)?),
            many => return Err(EscrowError::TooManySignatures(many.len())),
        };

        let mut escrow = EscrowInput {
            input,
            output,
            input_public_keys,
            reclaim_public_key,
            redeem_script,
            signature: None,
        };
        if let Some(signature) = restored {
            escrow.check_binding(&signature)?;
            escrow.attach(signature)?;
        }
        Ok(escrow)
    }

    pub fn input(&self) -> &TransactionInput {
        &self.input
    }

    pub fn output(&self) -> &TransactionOutput {
        &self.output
    }

    pub fn input_public_keys(&self) -> &[PublicKey] {
        &self.input_public_keys
    }

    pub fn reclaim_public_key(&self) -> &PublicKey {
        &self.reclaim_public_key
    }

    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    pub fn signature(&self) -> Option<&TransactionSignature> {
        self.signature.as_ref()
    }

    /// Current unlocking script, empty until a signature is attached.
    pub fn script_sig(&self) -> &ByteString {
        &self.input.script_sig
    }

    /// Reject signatures that could never satisfy this input's unlocking
    /// script: wrong key or a different outpoint.
    fn check_binding(&self, signature: &TransactionSignature) -> Result<()> {
        // The unlocking script always presents the reclaim key, so a signature
        // from any other key could never satisfy OP_CHECKSIG.
        if signature.public_key != self.reclaim_public_key {
            warn!("Rejected signature from non-reclaim key {}", signature.public_key);
            return Err(EscrowError::InvalidSignature(format!(
                "Signature key {} is not the reclaim key",
                signature.public_key
            )));
        }
        let prevout = &self.input.prevout;
        if signature.prev_tx_id != prevout.hash || signature.output_index != prevout.index {
            warn!(
                "Rejected signature for outpoint {}:{}, input spends {}:{}",
                hex::encode(signature.prev_tx_id),
                signature.output_index,
                hex::encode(prevout.hash),
                prevout.index
            );
            return Err(EscrowError::InvalidSignature(format!(
                "Signature covers outpoint {}:{}, not {}:{}",
                hex::encode(signature.prev_tx_id),
                signature.output_index,
                hex::encode(prevout.hash),
                prevout.index
            )));
        }
        Ok(())
    }

    /// Store `signature` and rebuild the unlocking script from it.
    ///
    /// Signatures restored at construction are bound to this input but not
    /// re-verified, since no transaction is available yet. Use
    /// [`SignableInput::is_valid_signature`] before broadcasting.
    fn attach(&mut self, signature: TransactionSignature) -> Result<()> {
        let script_sig = self.unlocking_script(&signature)?;
        debug!("Attached unlocking script {}", hex::encode(&script_sig));
        self.input.script_sig = script_sig;
        self.signature = Some(signature);
        Ok(())
    }

    /// `<sig||sighash> <reclaim key> <redeem script>`, each with its minimal
    /// push prefix.
    fn unlocking_script(&self, signature: &TransactionSignature) -> Result<ByteString> {
        let mut script = Vec::new();
        write_push(&mut script, &signature.to_script_bytes())?;
        write_push(&mut script, &self.reclaim_public_key.serialize())?;
        write_push(&mut script, &self.redeem_script.to_bytes()?)?;
        Ok(script)
    }
}

impl SignableInput for EscrowInput {
    fn produce_signatures(
        &self,
        tx: &Transaction,
        private_key: &SecretKey,
        input_index: usize,
        sighash_type: Option<SighashType>,
        signing_method: SigningMethod,
    ) -> Result<Vec<TransactionSignature>> {
        let spending = tx.inputs.get(input_index).ok_or(EscrowError::InputIndexOutOfRange {
            index: input_index,
            inputs: tx.inputs.len(),
        })?;
        if spending.prevout != self.input.prevout {
            debug!(
                "Input {} spends {}:{}, not this escrow output; no signature produced",
                input_index,
                hex::encode(spending.prevout.hash),
                spending.prevout.index
            );
            return Ok(Vec::new());
        }

        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, private_key);
        if public_key != self.reclaim_public_key {
            debug!("Key {} is not the reclaim key, no signature produced", public_key);
            return Ok(Vec::new());
        }

        let sighash_type = sighash_type.unwrap_or_default();
        let signature = sighash::sign(
            tx,
            private_key,
            sighash_type,
            input_index,
            &self.redeem_script.to_bytes()?,
            self.output.value,
            signing_method,
        )?;

        Ok(vec![TransactionSignature {
            public_key,
            prev_tx_id: self.input.prevout.hash,
            output_index: self.input.prevout.index,
            input_index,
            signature,
            sighash_type,
        }])
    }

    fn is_valid_signature(
        &self,
        tx: &Transaction,
        signature: &TransactionSignature,
        signing_method: SigningMethod,
    ) -> bool {
        let script_code = match self.redeem_script.to_bytes() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        sighash::verify(
            tx,
            &signature.signature,
            &signature.public_key,
            signature.sighash_type,
            signature.input_index,
            &script_code,
            self.output.value,
            signing_method,
        )
    }

    fn add_signature(
        &mut self,
        tx: &Transaction,
        signature: TransactionSignature,
        signing_method: SigningMethod,
    ) -> Result<()> {
        self.check_binding(&signature)?;
        match tx.inputs.get(signature.input_index) {
            Some(spending) if spending.prevout == self.input.prevout => {}
            _ => {
                warn!(
                    "Rejected signature for input {}, which does not spend this escrow output",
                    signature.input_index
                );
                return Err(EscrowError::InvalidSignature(format!(
                    "Input {} does not spend this escrow output",
                    signature.input_index
                )));
            }
        }
        if !self.is_valid_signature(tx, &signature, signing_method) {
            warn!("Rejected invalid signature for input {}", signature.input_index);
            return Err(EscrowError::InvalidSignature(format!(
                "Signature does not verify for input {}",
                signature.input_index
            )));
        }

        self.attach(signature)
    }

    fn clear_signatures(&mut self) {
        self.signature = None;
        self.input.script_sig.clear();
    }

    fn is_fully_signed(&self) -> bool {
        self.signature.is_some()
    }
}
