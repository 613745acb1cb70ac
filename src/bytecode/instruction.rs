use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use super::DispatchKey;

/**
  Opcodes of the virtual machine.

  Rust stores enum variants as bytes. As in C, enum values are represented by consecutive
  natural numbers and can be treated as numeric types, so the discriminant is the opcode
  byte of the encoded instruction. Appending opcodes is safe; reordering them changes the
  encoding of existing code.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
  Null,           // null
  Halt,           // halt
  Reset,          // reset                      discards temporaries
  // Masking //
  ClearMask,      // clear_mask
  GenerateMask,   // generate_mask( predicate )
  InvertMask,     // invert_mask
  // Jumps //
  JumpEmpty,      // jump_empty( target )
  JumpNotEmpty,   // jump_not_empty( target )
  Jump,           // jump( target )
  // Computation //
  Transform,      // transform( result, matrix, point )
  Multiply,       // multiply( result, lhs, rhs )
  Divide,         // divide( result, lhs, rhs )
  Add,            // add( result, lhs, rhs )
  Subtract,       // subtract( result, lhs, rhs )
  Greater,        // greater( result, lhs, rhs )
  GreaterEqual,   // greater_equal( result, lhs, rhs )
  Less,           // less( result, lhs, rhs )
  LessEqual,      // less_equal( result, lhs, rhs )
  And,            // and( result, lhs, rhs )
  Or,             // or( result, lhs, rhs )
  Equal,          // equal( result, lhs, rhs )
  NotEqual,       // not_equal( result, lhs, rhs )
  Negate,         // negate( result, operand )
  // Masked writes //
  Assign,         // assign( destination, source )
  AddAssign,      // add_assign( destination, source )
  SubtractAssign, // subtract_assign( destination, source )
  MultiplyAssign, // multiply_assign( destination, source )
  DivideAssign,   // divide_assign( destination, source )
  // Calls //
  Call,           // call( function, result, argument... )
  Evaluate,       // evaluate( shader name )
  // Conversion //
  Promote,        // promote( result, operand )   uniform to varying
  Convert,        // convert( result, operand, type )
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// The number of operand words following the instruction word, or `None` for `call`,
  /// which carries its own argument count.
  pub fn operand_count(&self) -> Option<usize> {
    match self {
      | Opcode::Null
      | Opcode::Halt
      | Opcode::Reset
      | Opcode::ClearMask
      | Opcode::InvertMask => Some(0),

      | Opcode::GenerateMask
      | Opcode::JumpEmpty
      | Opcode::JumpNotEmpty
      | Opcode::Jump
      | Opcode::Evaluate => Some(1),

      | Opcode::Negate
      | Opcode::Assign
      | Opcode::AddAssign
      | Opcode::SubtractAssign
      | Opcode::MultiplyAssign
      | Opcode::DivideAssign
      | Opcode::Promote => Some(2),

      | Opcode::Transform
      | Opcode::Multiply
      | Opcode::Divide
      | Opcode::Add
      | Opcode::Subtract
      | Opcode::Greater
      | Opcode::GreaterEqual
      | Opcode::Less
      | Opcode::LessEqual
      | Opcode::And
      | Opcode::Or
      | Opcode::Equal
      | Opcode::NotEqual
      | Opcode::Convert => Some(3),

      Opcode::Call => None,
    }
  }

  /// True for opcodes whose single operand is a code offset.
  pub fn is_jump(&self) -> bool {
    matches!(self, Opcode::JumpEmpty | Opcode::JumpNotEmpty | Opcode::Jump)
  }

  /// True for opcodes that select a kernel by dispatch key.
  pub fn requires_key(&self) -> bool {
    match self {
      | Opcode::Null
      | Opcode::Halt
      | Opcode::Reset
      | Opcode::ClearMask
      | Opcode::GenerateMask
      | Opcode::InvertMask
      | Opcode::JumpEmpty
      | Opcode::JumpNotEmpty
      | Opcode::Jump
      | Opcode::Call
      | Opcode::Evaluate => false,
      _ => true
    }
  }

  /// True for opcodes whose key holds a single shape rather than a pair.
  pub fn has_single_shape(&self) -> bool {
    matches!(self, Opcode::Negate | Opcode::Transform)
  }
}

/// Holds the decoded components of an instruction word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  pub opcode : Opcode,
  pub key    : DispatchKey,
}

impl Instruction {
  pub fn new(opcode: Opcode, key: DispatchKey) -> Instruction {
    Instruction { opcode, key }
  }

  pub fn nullary(opcode: Opcode) -> Instruction {
    Instruction { opcode, key: DispatchKey::NONE }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.key == DispatchKey::NONE {
      true  => write!(f, "{}", self.opcode),
      false => write!(f, "{}.{}", self.opcode, self.key),
    }
  }
}
