/*!
  Operand shapes and dispatch keys. A shape is a storage class and an element count; the
  variant set is closed, so kernel lookup is an exhaustive match rather than a search.
*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::types::Storage;
use crate::value::Value;

const UNIFORM_FLAG  : u8 = 0x10;
const VARYING_FLAG  : u8 = 0x20;
const ELEMENTS_MASK : u8 = 0x0f;

/// The number of floats per element an operand has as far as a kernel is concerned.
#[derive(TryFromPrimitive, IntoPrimitive, Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[repr(u8)]
pub enum Width {
  One   = 1,
  Two   = 2,
  Three = 3,
  Four  = 4,
}

impl Width {
  pub fn count(&self) -> usize {
    Into::<u8>::into(*self) as usize
  }

  pub fn of(components: usize) -> Option<Width> {
    if components > 4 {
      return None;
    }
    Width::try_from(components as u8).ok()
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Shape {
  pub storage : Storage,
  pub width   : Width,
}

impl Shape {
  pub fn new(storage: Storage, width: Width) -> Shape {
    Shape { storage, width }
  }

  pub fn uniform(width: Width) -> Shape {
    Shape::new(Storage::Uniform, width)
  }

  pub fn varying(width: Width) -> Shape {
    Shape::new(Storage::Varying, width)
  }

  /// The shape a kernel sees for `value`; `None` for matrices and strings, which are never
  /// operands of shape dispatched kernels.
  pub fn of(value: &Value) -> Option<Shape> {
    Width::of(value.components()).map(|width| Shape::new(value.storage(), width))
  }

  pub fn encode(&self) -> u8 {
    let flag = match self.storage {
      Storage::Uniform => UNIFORM_FLAG,
      Storage::Varying => VARYING_FLAG,
    };
    flag | Into::<u8>::into(self.width)
  }

  pub fn decode(byte: u8) -> Option<Shape> {
    let storage = match byte & !ELEMENTS_MASK {
      UNIFORM_FLAG => Storage::Uniform,
      VARYING_FLAG => Storage::Varying,
      _            => return None,
    };
    Width::try_from(byte & ELEMENTS_MASK).ok().map(|width| Shape::new(storage, width))
  }
}

impl Display for Shape {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let storage = match self.storage {
      Storage::Uniform => 'u',
      Storage::Varying => 'v',
    };
    write!(f, "{}{}", storage, self.width.count())
  }
}

impl FromStr for Shape {
  type Err = ();

  fn from_str(text: &str) -> Result<Shape, ()> {
    let mut chars = text.chars();
    let storage = match chars.next() {
      Some('u') => Storage::Uniform,
      Some('v') => Storage::Varying,
      _         => return Err(()),
    };
    let width = match (chars.next().and_then(|c| c.to_digit(10)), chars.next()) {
      (Some(digit), None) => Width::of(digit as usize).ok_or(())?,
      _                   => return Err(()),
    };
    Ok(Shape::new(storage, width))
  }
}

/**
  The operand shapes of an instruction packed into 16 bits: the first operand's shape in the
  high byte, the second's in the low byte. Single shape keys leave the high byte zero.
*/
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Default)]
pub struct DispatchKey(u16);

impl DispatchKey {
  pub const NONE: DispatchKey = DispatchKey(0);

  pub fn single(shape: Shape) -> DispatchKey {
    DispatchKey(shape.encode() as u16)
  }

  pub fn pair(first: Shape, second: Shape) -> DispatchKey {
    DispatchKey(((first.encode() as u16) << 8) | second.encode() as u16)
  }

  pub fn from_bits(bits: u16) -> DispatchKey {
    DispatchKey(bits)
  }

  pub fn bits(&self) -> u16 {
    self.0
  }

  /// Both shapes of a pair key.
  pub fn shapes(&self) -> Option<(Shape, Shape)> {
    Some((Shape::decode((self.0 >> 8) as u8)?, Shape::decode(self.0 as u8)?))
  }

  /// The shape of a single shape key.
  pub fn shape(&self) -> Option<Shape> {
    match self.0 >> 8 {
      0 => Shape::decode(self.0 as u8),
      _ => None,
    }
  }

  /// True if every nonzero byte of the key is a valid shape.
  pub fn is_well_formed(&self) -> bool {
    let high = (self.0 >> 8) as u8;
    let low  = self.0 as u8;
    match (high, low) {
      (0, 0) => true,
      (0, _) => Shape::decode(low).is_some(),
      _      => self.shapes().is_some(),
    }
  }
}

impl Display for DispatchKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if let Some((first, second)) = self.shapes() {
      return write!(f, "{}{}", first, second);
    }
    if let Some(shape) = self.shape() {
      return write!(f, "{}", shape);
    }
    write!(f, "{:#06x}", self.0)
  }
}

impl FromStr for DispatchKey {
  type Err = ();

  fn from_str(text: &str) -> Result<DispatchKey, ()> {
    match text.len() {
      2 => Ok(DispatchKey::single(text.parse()?)),
      4 if text.is_char_boundary(2) => {
        Ok(DispatchKey::pair(text[..2].parse()?, text[2..].parse()?))
      }
      _ => Err(()),
    }
  }
}
