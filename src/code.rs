//! The output artifact of parsing one function body.

use alloc::vec::Vec;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::error::ParserError;

/// The single-result Wasm MVP convention for a block's or function's
/// declared result type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ResultType {
    Empty,
    I32,
    I64,
    F32,
    F64,
}

impl ResultType {
    /// Decodes a block-type byte: `0x40` for empty, or one of the four
    /// value-type bytes.
    pub(crate) fn from_blocktype_byte(byte: u8) -> Result<Self, ParserError> {
        match byte {
            0x40 => Ok(Self::Empty),
            0x7f => Ok(Self::I32),
            0x7e => Ok(Self::I64),
            0x7d => Ok(Self::F32),
            0x7c => Ok(Self::F64),
            other => Err(ParserError::invalid_valtype(other)),
        }
    }

    /// The number of values this result type produces: 0 or 1.
    pub fn arity(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::I32 | Self::I64 | Self::F32 | Self::F64 => 1,
        }
    }
}

/// The linearized output of parsing one expression (function body).
///
/// An execution engine walks `instructions` and reads immediates out of
/// `immediates` at the fixed per-instruction widths documented in this
/// crate's top-level docs; neither array needs to be re-scanned once
/// produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Code {
    /// The flattened opcode byte sequence, in the order instructions appear
    /// in the source. `end` opcodes are preserved; the sequence is
    /// terminated by the outer `end`.
    pub instructions: Vec<u8>,
    /// A contiguous buffer holding each instruction's decoded immediates, in
    /// instruction order, at fixed in-buffer widths. Instructions without
    /// immediates contribute nothing.
    pub immediates: Vec<u8>,
    /// The peak operand-stack depth (above locals) observed while parsing.
    pub max_stack_height: u32,
}

impl Code {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The instruction index that will be assigned to the next instruction
    /// appended to `instructions`.
    pub(crate) fn next_instr_index(&self) -> u32 {
        self.instructions.len() as u32
    }

    /// The byte offset the next immediate write will land at.
    pub(crate) fn next_immediate_offset(&self) -> u32 {
        self.immediates.len() as u32
    }

    pub(crate) fn push_instr(&mut self, opcode: u8) {
        self.instructions.push(opcode);
    }

    pub(crate) fn push_u8(&mut self, value: u8) {
        self.immediates.push(value);
    }

    pub(crate) fn push_u32(&mut self, value: u32) {
        self.immediates.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn push_i32(&mut self, value: i32) {
        self.immediates.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn push_i64(&mut self, value: i64) {
        self.immediates.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn push_bytes<const N: usize>(&mut self, bytes: [u8; N]) {
        self.immediates.extend_from_slice(&bytes);
    }

    /// Overwrites the 4-byte little-endian `u32` placeholder reserved at
    /// `offset`.
    pub(crate) fn patch_u32(&mut self, offset: u32, value: u32) {
        let offset = offset as usize;
        self.immediates[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}
