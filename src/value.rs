/*!
  A `Value` is the unit of data the virtual machine reads and writes: a typed, storage classed
  buffer of floats. A uniform value holds exactly one element; a varying value holds one
  element per point of the grid it belongs to. Elements are stored flat, so a varying color on
  a grid of `n` points is `3n` floats.

  Strings are always uniform and are held as an interned atom rather than in the float buffer.
  Matrices are sixteen floats in column major order.
*/

use std::fmt::{Display, Formatter};

use glam::{Mat4, Vec3};
use string_cache::DefaultAtom;

use crate::types::{Storage, ValueType};

#[derive(Clone, Debug, PartialEq)]
pub struct Value {
  ty      : ValueType,
  storage : Storage,
  /// Number of elements; 1 for uniform values, the grid's point count for varying values.
  size    : usize,
  values  : Vec<f32>,
  string  : Option<DefaultAtom>,
}

impl Default for Value {
  fn default() -> Value {
    Value::empty()
  }
}

impl Value {

  // region Construction

  /// Creates a zero filled value.
  pub fn new(ty: ValueType, storage: Storage, size: usize) -> Value {
    debug_assert!(
      storage.is_varying() || size == 1,
      "uniform values hold exactly one element, not {}", size
    );
    Value {
      ty,
      storage,
      size,
      values: vec![0.0; ty.components() * size],
      string: None,
    }
  }

  /// A value with no elements. This is the state of a temporary that holds no result.
  pub fn empty() -> Value {
    Value {
      ty      : ValueType::Float,
      storage : Storage::Uniform,
      size    : 0,
      values  : Vec::new(),
      string  : None,
    }
  }

  pub fn uniform_float(value: f32) -> Value {
    let mut result = Value::new(ValueType::Float, Storage::Uniform, 1);
    result.values[0] = value;
    result
  }

  pub fn uniform_vec3(ty: ValueType, value: Vec3) -> Value {
    assert!(ty.is_triple(), "{} is not a three component type", ty);
    let mut result = Value::new(ty, Storage::Uniform, 1);
    result.set_vec3(0, value);
    result
  }

  pub fn uniform_matrix(matrix: Mat4) -> Value {
    let mut result = Value::new(ValueType::Matrix, Storage::Uniform, 1);
    result.values.copy_from_slice(&matrix.to_cols_array());
    result
  }

  pub fn uniform_string(text: &str) -> Value {
    let mut result = Value::new(ValueType::String, Storage::Uniform, 1);
    result.string = Some(DefaultAtom::from(text));
    result
  }

  pub fn varying_float(values: &[f32]) -> Value {
    Value {
      ty      : ValueType::Float,
      storage : Storage::Varying,
      size    : values.len(),
      values  : values.to_vec(),
      string  : None,
    }
  }

  pub fn varying_vec3(ty: ValueType, values: &[Vec3]) -> Value {
    assert!(ty.is_triple(), "{} is not a three component type", ty);
    let mut result = Value::new(ty, Storage::Varying, values.len());
    for (i, value) in values.iter().enumerate() {
      result.set_vec3(i, *value);
    }
    result
  }

  // endregion

  // region Shape

  pub fn ty(&self) -> ValueType {
    self.ty
  }

  pub fn storage(&self) -> Storage {
    self.storage
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn components(&self) -> usize {
    self.ty.components()
  }

  pub fn is_uniform(&self) -> bool {
    self.storage == Storage::Uniform
  }

  pub fn is_varying(&self) -> bool {
    self.storage == Storage::Varying
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  /**
    Re-types and re-sizes the value, zero filling its buffer. Any previous contents are
    discarded; the buffer's allocation is reused where it is large enough.
  */
  pub fn reset(&mut self, ty: ValueType, storage: Storage, size: usize) {
    self.ty      = ty;
    self.storage = storage;
    self.size    = size;
    self.string  = None;
    self.values.clear();
    self.values.resize(ty.components() * size, 0.0);
  }

  /// Resets the value only if its type, storage, or size differ from those given. Returns
  /// whether a reset happened.
  pub fn ensure(&mut self, ty: ValueType, storage: Storage, size: usize) -> bool {
    if self.ty == ty && self.storage == storage && self.size == size {
      return false;
    }
    self.reset(ty, storage, size);
    true
  }

  /// Changes the element type without touching the buffer. Both types must have the same
  /// number of components.
  pub fn retype(&mut self, ty: ValueType) {
    assert_eq!(
      self.ty.components(), ty.components(),
      "cannot retype {} as {}", self.ty, ty
    );
    self.ty = ty;
  }

  pub fn zero(&mut self) {
    for value in self.values.iter_mut() {
      *value = 0.0;
    }
  }

  /// A varying copy of a uniform value, broadcast over `size` points. Varying values are
  /// cloned as they are.
  pub fn broadcast(&self, size: usize) -> Value {
    if self.is_varying() {
      return self.clone();
    }
    let mut result = Value::new(self.ty, Storage::Varying, size);
    let components = self.components();
    for element in result.values.chunks_mut(components.max(1)) {
      element.copy_from_slice(&self.values[..components]);
    }
    result.string = self.string.clone();
    result
  }

  // endregion

  // region Element access

  pub fn floats(&self) -> &[f32] {
    &self.values
  }

  pub fn floats_mut(&mut self) -> &mut [f32] {
    &mut self.values
  }

  /// The index of point `i`'s element; every point reads element zero of a uniform value.
  fn element_index(&self, i: usize) -> usize {
    match self.storage {
      Storage::Uniform => 0,
      Storage::Varying => i,
    }
  }

  pub fn float(&self, i: usize) -> f32 {
    self.values[self.element_index(i)]
  }

  pub fn set_float(&mut self, i: usize, value: f32) {
    let index = self.element_index(i);
    self.values[index] = value;
  }

  pub fn vec3(&self, i: usize) -> Vec3 {
    let base = self.element_index(i) * 3;
    Vec3::new(self.values[base], self.values[base + 1], self.values[base + 2])
  }

  pub fn set_vec3(&mut self, i: usize, value: Vec3) {
    let base = self.element_index(i) * 3;
    self.values[base..base + 3].copy_from_slice(&value.to_array());
  }

  pub fn matrix(&self, i: usize) -> Mat4 {
    let base = self.element_index(i) * 16;
    let mut columns = [0.0f32; 16];
    columns.copy_from_slice(&self.values[base..base + 16]);
    Mat4::from_cols_array(&columns)
  }

  /// The text of a string value.
  pub fn string(&self) -> &str {
    match &self.string {
      Some(atom) => &**atom,
      None       => unreachable!("Error: A {} value was used where a string was required.", self.ty),
    }
  }

  // endregion
}

impl Display for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if let Some(atom) = &self.string {
      return write!(f, "\"{}\"", atom);
    }
    let components = self.components().max(1);
    let elements: Vec<String> =
      self.values
          .chunks(components)
          .map(|element| match element.len() {
            1 => format!("{}", element[0]),
            _ => format!(
              "({})",
              element.iter().map(f32::to_string).collect::<Vec<String>>().join(", ")
            ),
          })
          .collect();
    write!(f, "{} {} [{}]", self.storage, self.ty, elements.join(", "))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffer_length_follows_type_and_storage() {
    let value = Value::new(ValueType::Color, Storage::Varying, 4);
    assert_eq!(value.floats().len(), 12);
    let value = Value::new(ValueType::Matrix, Storage::Uniform, 1);
    assert_eq!(value.floats().len(), 16);
    let value = Value::uniform_string("world");
    assert_eq!(value.floats().len(), 0);
    assert_eq!(value.string(), "world");
  }

  #[test]
  fn reset_zero_fills() {
    let mut value = Value::varying_float(&[1.0, 2.0, 3.0]);
    value.reset(ValueType::Point, Storage::Varying, 2);
    assert_eq!(value.floats(), &[0.0; 6]);
    assert_eq!(value.ty(), ValueType::Point);
    assert!(!value.ensure(ValueType::Point, Storage::Varying, 2));
    assert!(value.ensure(ValueType::Float, Storage::Uniform, 1));
  }

  #[test]
  fn uniform_values_broadcast_on_read() {
    let value = Value::uniform_vec3(ValueType::Vector, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(value.vec3(7), Vec3::new(1.0, 2.0, 3.0));
    let varying = value.broadcast(3);
    assert_eq!(varying.size(), 3);
    assert_eq!(varying.vec3(2), Vec3::new(1.0, 2.0, 3.0));
  }

  #[test]
  fn matrices_round_trip_column_major() {
    let matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let value = Value::uniform_matrix(matrix);
    assert_eq!(value.matrix(0), matrix);
    assert_eq!(&value.floats()[12..15], &[1.0, 2.0, 3.0]);
  }
}
