//! An operand address: a constant, a symbol, or a temporary, with some convenience functions.
//! Addresses are encoded in the operand words that follow an instruction word.

use std::fmt::{Display, Formatter};

use crate::bytecode::Word;

// `AddressNumberType` is `u32`, as addresses are stored in code words.
pub type AddressNumberType = u32;

const KIND_SHIFT : u32  = 30;
const INDEX_MASK : Word = (1 << KIND_SHIFT) - 1;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// An index into the shader's constant table. Constants are uniform and read only.
  Constant(AddressNumberType),
  /// An index into the shader's symbol table: globals, parameters, and local variables.
  Symbol(AddressNumberType),
  /// An index into the machine's temporaries, which hold intermediate results.
  Temporary(AddressNumberType),
}

impl Address {
  /// Converts the address to an index into the corresponding vector.
  pub fn idx(&self) -> usize {
    match self {
      | Address::Constant(i)
      | Address::Symbol(i)
      | Address::Temporary(i) => *i as usize,
    }
  }

  /// Encodes the address as an operand word: [Kind:2][Index:30].
  pub fn encode(&self) -> Word {
    let (kind, index) = match self {
      Address::Constant(i)  => (0, *i),
      Address::Symbol(i)    => (1, *i),
      Address::Temporary(i) => (2, *i),
    };
    debug_assert!(index <= INDEX_MASK, "address index {} does not fit in 30 bits", index);
    (kind << KIND_SHIFT) | (index & INDEX_MASK)
  }

  /// Decodes an operand word. Kind 3 is unassigned.
  pub fn decode(word: Word) -> Option<Address> {
    let index = word & INDEX_MASK;
    match word >> KIND_SHIFT {
      0 => Some(Address::Constant(index)),
      1 => Some(Address::Symbol(index)),
      2 => Some(Address::Temporary(index)),
      _ => None,
    }
  }

  /// Panics if the address is a constant, which is never a legal destination.
  pub fn require_writable(&self) {
    if let Address::Constant(_) = self {
      unreachable!(
        "Error: A constant address was given when a writable address was required: {}",
        self
      );
    }
  }

  pub fn is_constant(&self) -> bool {
    matches!(self, Address::Constant(_))
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Constant(i) => {
        write!(f, "#{}", i)
      },
      Address::Symbol(i) => {
        write!(f, "@{}", i)
      },
      Address::Temporary(i) => {
        write!(f, "%{}", i)
      }
    }
  }
}
