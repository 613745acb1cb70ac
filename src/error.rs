//! Errors reported across the crate's public boundary. Failures inside a running instruction
//! stream are internal invariant violations and panic instead; see `machine`.

use thiserror::Error;

use crate::bytecode::Opcode;
use crate::types::{Storage, ValueType};

/// A word that does not decode as an instruction.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
  #[error("unknown opcode {0:#04x}")]
  UnknownOpcode(u8),

  #[error("invalid operand shape {0:#04x}")]
  InvalidShape(u8),

  #[error("reserved bits set in instruction word {0:#010x}")]
  ReservedBits(u32),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum GridError {
  #[error("value `{name}` has {actual} elements but the grid requires {expected}")]
  SizeMismatch { name: String, expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum MachineError {
  #[error("grid value `{name}` is {actual} but the shader declares it {expected}")]
  TypeMismatch { name: String, expected: ValueType, actual: ValueType },

  #[error("grid value `{name}` is {actual} but the shader declares it {expected}")]
  StorageMismatch { name: String, expected: Storage, actual: Storage },

  #[error(transparent)]
  Grid(#[from] GridError),

  #[error("output grid is {}x{} but the input grid is {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
  GridMismatch { expected: (usize, usize), actual: (usize, usize) },

  #[error("instruction limit of {limit} reached")]
  InstructionLimit { limit: u64 },
}

/// Errors found while assembling shader assembly text. Lines count from 1.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum AssemblyError {
  #[error("line {line}: cannot parse `{text}`")]
  Syntax { line: usize, text: String },

  #[error("line {line}: `{name}` is not an operation")]
  NotAnOperation { line: usize, name: String },

  #[error("line {line}: {operation} requires {expected} operands but was given {actual}")]
  WrongArity { line: usize, operation: Opcode, expected: usize, actual: usize },

  #[error("line {line}: {operation} requires a dispatch key such as `.v1u1`")]
  MissingKey { line: usize, operation: Opcode },

  #[error("line {line}: `{text}` is not a dispatch key")]
  InvalidKey { line: usize, text: String },

  #[error("line {line}: expected {expected} but found `{found}`")]
  UnexpectedOperand { line: usize, expected: &'static str, found: String },

  #[error("line {line}: unknown symbol `{name}`")]
  UnknownSymbol { line: usize, name: String },

  #[error("line {line}: unknown label `{name}`")]
  UnknownLabel { line: usize, name: String },

  #[error("line {line}: `{name}` is already defined")]
  Redefinition { line: usize, name: String },

  #[error("line {line}: {message}")]
  InvalidDirective { line: usize, message: String },
}
