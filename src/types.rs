//! Element types and storage classes of shading language values.

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

/**
  The element type of a value. Points, vectors, normals, and colors share a three component
  representation, so kernels written for one of them work for all of them. The discriminant
  is part of the bytecode: `convert` carries the target type as an operand word.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ValueType {
  Float,
  Point,
  Vector,
  Normal,
  Color,
  Matrix,
  String,
}

impl ValueType {
  /// The number of floats in one element of this type. Strings are held outside the float
  /// buffer and so have no components.
  pub fn components(&self) -> usize {
    match self {
      ValueType::Float  => 1,
      | ValueType::Point
      | ValueType::Vector
      | ValueType::Normal
      | ValueType::Color  => 3,
      ValueType::Matrix => 16,
      ValueType::String => 0,
    }
  }

  /// True for the types stored as a `Vec3`.
  pub fn is_triple(&self) -> bool {
    self.components() == 3
  }

  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }
}

/// Whether a value holds one element shared by the whole grid or one element per point.
#[derive(StrumDisplay, EnumString, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Storage {
  Uniform,
  Varying,
}

impl Storage {
  pub fn is_varying(&self) -> bool {
    *self == Storage::Varying
  }

  /// The element count of a value with this storage on a grid of `points` points.
  pub fn size(&self, points: usize) -> usize {
    match self {
      Storage::Uniform => 1,
      Storage::Varying => points,
    }
  }

  /// The storage of a result computed from operands of storage `self` and `other`.
  pub fn widest(self, other: Storage) -> Storage {
    match (self, other) {
      (Storage::Uniform, Storage::Uniform) => Storage::Uniform,
      _                                    => Storage::Varying,
    }
  }
}
