//! Typed script programs
//!
//! A [`Script`] is an append-only sequence of instructions and data pushes.
//! All length-prefix rules live in [`Script::to_bytes`]: generators only say
//! *what* to push and never hand-encode a length byte.

use crate::constants::*;
use crate::error::{EscrowError, Result};
use crate::hash::hash160;
use crate::number::encode_number;
use crate::opcodes::*;
use crate::types::{ByteString, Hash160};
use std::fmt;

/// One element of a script program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptElement {
    Op(Opcode),
    Push(ByteString),
}

/// An ordered program of opcodes and data pushes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    elements: Vec<ScriptElement>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn push_opcode(mut self, opcode: Opcode) -> Self {
        self.elements.push(ScriptElement::Op(opcode));
        self
    }

    /// Append a data push.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        self.elements.push(ScriptElement::Push(data.to_vec()));
        self
    }

    /// Append a numeric operand using the minimal big-endian encoding.
    pub fn push_number(self, n: u64) -> Self {
        let data = encode_number(n);
        self.push_slice(&data)
    }

    /// Append every element of `other`.
    pub fn append(mut self, other: Script) -> Self {
        self.elements.extend(other.elements);
        self
    }

    pub fn elements(&self) -> &[ScriptElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize to the wire format, choosing the minimal push form for
    /// every data element.
    pub fn to_bytes(&self) -> Result<ByteString> {
        let mut bytes = Vec::new();
        for element in &self.elements {
            match element {
                ScriptElement::Op(opcode) => bytes.push(opcode.to_byte()),
                ScriptElement::Push(data) => write_push(&mut bytes, data)?,
            }
        }
        Ok(bytes)
    }

    /// Lowercase hex of the serialized script.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// HASH160 of the serialized script.
    pub fn hash160(&self) -> Result<Hash160> {
        Ok(hash160(&self.to_bytes()?))
    }

    /// Pay-to-script-hash locking script: `OP_HASH160 <hash> OP_EQUAL`.
    pub fn p2sh(script_hash: &Hash160) -> Script {
        Script::new()
            .push_opcode(OP_HASH160)
            .push_slice(script_hash)
            .push_opcode(OP_EQUAL)
    }

    /// Decode a serialized script. Non-minimal pushes decode to the same
    /// element as their minimal form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Script> {
        let mut elements = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let op = bytes[pos];
            pos += 1;
            let len = match op {
                OP_0 => 0,
                0x01..=0x4b => op as usize,
                OP_PUSHDATA1 => read_le(bytes, &mut pos, 1)?,
                OP_PUSHDATA2 => read_le(bytes, &mut pos, 2)?,
                OP_PUSHDATA4 => read_le(bytes, &mut pos, 4)?,
                _ => {
                    // Not a push: every byte above OP_PUSHDATA4 is an opcode.
                    let opcode = Opcode::from_byte(op).ok_or_else(|| {
                        EscrowError::ScriptParse(format!("Unexpected byte 0x{:02x}", op))
                    })?;
                    elements.push(ScriptElement::Op(opcode));
                    continue;
                }
            };
            let end = pos
                .checked_add(len)
                .filter(|end| *end <= bytes.len())
                .ok_or_else(|| {
                    EscrowError::ScriptParse(format!(
                        "Push of {} bytes at offset {} runs past end of script",
                        len, pos
                    ))
                })?;
            elements.push(ScriptElement::Push(bytes[pos..end].to_vec()));
            pos = end;
        }
        Ok(Script { elements })
    }

    /// Space-separated mnemonic rendering. Data pushes render as
    /// `<len> 0x<hex>`, prefixed by the PUSHDATA opcode when one is needed.
    pub fn to_asm(&self) -> String {
        self.elements
            .iter()
            .map(|element| match element {
                ScriptElement::Op(opcode) => opcode.to_string(),
                ScriptElement::Push(data) if data.is_empty() => "OP_0".to_string(),
                ScriptElement::Push(data) => {
                    let prefix = match data.len() {
                        len if len <= MAX_DIRECT_PUSH => "",
                        len if len <= MAX_PUSHDATA1 => "OP_PUSHDATA1 ",
                        len if len <= MAX_PUSHDATA2 => "OP_PUSHDATA2 ",
                        _ => "OP_PUSHDATA4 ",
                    };
                    format!("{}{} 0x{}", prefix, data.len(), hex::encode(data))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_asm())
    }
}

/// Minimal length descriptor for a push of `len` bytes.
///
/// - 0 bytes: OP_0
/// - 1..=75: a single length byte
/// - 76..=255: OP_PUSHDATA1 + 1-byte length
/// - 256..=65535: OP_PUSHDATA2 + 2-byte little-endian length
/// - larger: OP_PUSHDATA4 + 4-byte little-endian length
pub fn push_data_prefix(len: usize) -> Result<ByteString> {
    if len == 0 {
        Ok(vec![OP_0])
    } else if len <= MAX_DIRECT_PUSH {
        Ok(vec![len as u8])
    } else if len <= MAX_PUSHDATA1 {
        Ok(vec![OP_PUSHDATA1, len as u8])
    } else if len <= MAX_PUSHDATA2 {
        let mut result = vec![OP_PUSHDATA2];
        result.extend_from_slice(&(len as u16).to_le_bytes());
        Ok(result)
    } else {
        let len32 = u32::try_from(len).map_err(|_| EscrowError::PushTooLarge(len))?;
        let mut result = vec![OP_PUSHDATA4];
        result.extend_from_slice(&len32.to_le_bytes());
        Ok(result)
    }
}

/// Push `data` with its minimal length prefix onto a raw byte buffer.
pub fn write_push(buf: &mut ByteString, data: &[u8]) -> Result<()> {
    buf.extend_from_slice(&push_data_prefix(data.len())?);
    buf.extend_from_slice(data);
    Ok(())
}

fn read_le(bytes: &[u8], pos: &mut usize, width: usize) -> Result<usize> {
    let end = *pos + width;
    if end > bytes.len() {
        return Err(EscrowError::ScriptParse(format!(
            "Truncated {}-byte push length at offset {}",
            width, pos
        )));
    }
    let mut value = 0usize;
    for (i, byte) in bytes[*pos..end].iter().enumerate() {
        value |= (*byte as usize) << (8 * i);
    }
    *pos = end;
    Ok(value)
}
