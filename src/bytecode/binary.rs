/*!
  This module is responsible for the encoding and decoding of instruction words.
*/

use std::convert::TryFrom;

use super::{DispatchKey, Instruction, Opcode, Shape};
use crate::error::DecodeError;

// If you change this you must also change `encode_instruction` and `try_decode_instruction`.
pub type Word = u32;

pub const OPCODE_MASK   : Word = 0xFF;
pub const KEY_SHIFT     : Word = 8;
const KEY_MASK          : Word = 0xFFFF;
const RESERVED_MASK     : Word = 0xFF00_0000;

/**
  Encodes the instruction word. It is the caller's responsibility to follow it with the
  operand words the opcode requires.
*/
pub fn encode_instruction(instruction: Instruction) -> Word {
  // [OpCode:8][Key:16][Reserved:8]
  (instruction.opcode.code() as Word) | ((instruction.key.bits() as Word) << KEY_SHIFT)
}

pub fn try_decode_instruction(word: Word) -> Result<Instruction, DecodeError> {
  if word & RESERVED_MASK != 0 {
    return Err(DecodeError::ReservedBits(word));
  }
  let code   = (word & OPCODE_MASK) as u8;
  let opcode =
    match Opcode::try_from(code) {
      Ok(opcode) => opcode,
      Err(_e)    => return Err(DecodeError::UnknownOpcode(code)),
    };

  let key = DispatchKey::from_bits(((word >> KEY_SHIFT) & KEY_MASK) as u16);
  if !key.is_well_formed() {
    let high = (key.bits() >> 8) as u8;
    let bad_byte = match Shape::decode(high) {
      Some(_) => key.bits() as u8,
      None if high == 0 => key.bits() as u8,
      None => high,
    };
    return Err(DecodeError::InvalidShape(bad_byte));
  }

  Ok(Instruction::new(opcode, key))
}

/**
  Returns the size in WORDS of the instruction starting at `code[ip]`, including its operand
  words. For `call` the argument count is read from the code.

  Note that this function assumes the word at `ip` is a valid instruction.
*/
pub fn instruction_size(code: &[Word], ip: usize, opcode: Opcode) -> usize {
  match opcode.operand_count() {
    Some(count) => 1 + count,
    // [Call][Function][Result][Argument Count][Argument]...
    None        => 4 + code[ip + 3] as usize,
  }
}
