//! Comparisons and logical operators. Every result is a float of 1.0 (true) or 0.0 (false).

use super::{element, element_count, BinaryKernel};
use crate::bytecode::{DispatchKey, Opcode, Width};
use crate::types::Storage;

pub(crate) trait Predicate {
  /// Compares one element of each operand.
  fn test(lhs: &[f32], rhs: &[f32]) -> bool;
}

pub(crate) struct Greater;
pub(crate) struct GreaterEqual;
pub(crate) struct Less;
pub(crate) struct LessEqual;
pub(crate) struct Equal;
pub(crate) struct NotEqual;
pub(crate) struct And;
pub(crate) struct Or;

impl Predicate for Greater {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] > rhs[0] }
}

impl Predicate for GreaterEqual {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] >= rhs[0] }
}

impl Predicate for Less {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] < rhs[0] }
}

impl Predicate for LessEqual {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] <= rhs[0] }
}

impl Predicate for Equal {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs == rhs }
}

impl Predicate for NotEqual {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs != rhs }
}

impl Predicate for And {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] != 0.0 && rhs[0] != 0.0 }
}

impl Predicate for Or {
  fn test(lhs: &[f32], rhs: &[f32]) -> bool { lhs[0] != 0.0 || rhs[0] != 0.0 }
}

fn test<P, const LV: bool, const RV: bool, const N: usize>(
  result : &mut [f32],
  lhs    : &[f32],
  rhs    : &[f32],
  points : usize
)
  where P: Predicate
{
  for i in 0..element_count(LV || RV, points) {
    let l = element::<LV>(i) * N;
    let r = element::<RV>(i) * N;
    result[i] = match P::test(&lhs[l..l + N], &rhs[r..r + N]) {
      true  => 1.0,
      false => 0.0,
    };
  }
}

fn storages<P, const N: usize>(key: DispatchKey) -> Option<BinaryKernel>
  where P: Predicate
{
  let (lhs, rhs) = key.shapes()?;
  if lhs.width.count() != N || rhs.width.count() != N {
    return None;
  }
  let kernel: BinaryKernel =
    match (lhs.storage, rhs.storage) {
      (Storage::Uniform, Storage::Uniform) => test::<P, false, false, N>,
      (Storage::Uniform, Storage::Varying) => test::<P, false, true, N>,
      (Storage::Varying, Storage::Uniform) => test::<P, true, false, N>,
      (Storage::Varying, Storage::Varying) => test::<P, true, true, N>,
    };
  Some(kernel)
}

fn widths<P: Predicate>(key: DispatchKey) -> Option<BinaryKernel> {
  match key.shapes()?.0.width {
    Width::One   => storages::<P, 1>(key),
    Width::Two   => storages::<P, 2>(key),
    Width::Three => storages::<P, 3>(key),
    Width::Four  => storages::<P, 4>(key),
  }
}

/// The kernel for a comparison opcode. Ordering compares floats only; equality compares
/// every component of operands of equal width.
pub fn compare(opcode: Opcode, key: DispatchKey) -> Option<BinaryKernel> {
  match opcode {
    Opcode::Greater      => storages::<Greater, 1>(key),
    Opcode::GreaterEqual => storages::<GreaterEqual, 1>(key),
    Opcode::Less         => storages::<Less, 1>(key),
    Opcode::LessEqual    => storages::<LessEqual, 1>(key),
    Opcode::Equal        => widths::<Equal>(key),
    Opcode::NotEqual     => widths::<NotEqual>(key),
    _                    => None,
  }
}

/// The kernel for `and` or `or`, which take floats only.
pub fn logical(opcode: Opcode, key: DispatchKey) -> Option<BinaryKernel> {
  match opcode {
    Opcode::And => storages::<And, 1>(key),
    Opcode::Or  => storages::<Or, 1>(key),
    _           => None,
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn key(text: &str) -> DispatchKey {
    text.parse().unwrap()
  }

  #[test]
  fn greater_against_a_uniform() {
    let kernel = compare(Opcode::Greater, key("v1u1")).unwrap();
    let mut result = [9.0; 4];
    kernel(&mut result, &[1.0, -1.0, 0.0, 2.0], &[0.0], 4);
    assert_eq!(result, [1.0, 0.0, 0.0, 1.0]);
  }

  #[test]
  fn equality_compares_every_component() {
    let kernel = compare(Opcode::Equal, key("v3u3")).unwrap();
    let mut result = [9.0; 2];
    kernel(&mut result, &[1.0, 2.0, 3.0, 1.0, 2.0, 4.0], &[1.0, 2.0, 3.0], 2);
    assert_eq!(result, [1.0, 0.0]);

    let kernel = compare(Opcode::NotEqual, key("u3u3")).unwrap();
    let mut result = [9.0; 2];
    kernel(&mut result, &[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 2);
    assert_eq!(result, [0.0, 9.0]);
  }

  #[test]
  fn ordering_rejects_triples() {
    assert!(compare(Opcode::Less, key("v3v3")).is_none());
    assert!(compare(Opcode::Equal, key("v3v1")).is_none());
  }

  #[test]
  fn logical_operators() {
    let kernel = logical(Opcode::And, key("v1v1")).unwrap();
    let mut result = [0.0; 3];
    kernel(&mut result, &[1.0, 0.0, 2.0], &[1.0, 1.0, 0.0], 3);
    assert_eq!(result, [1.0, 0.0, 0.0]);

    let kernel = logical(Opcode::Or, key("u1v1")).unwrap();
    kernel(&mut result, &[0.0], &[1.0, 0.0, 3.0], 3);
    assert_eq!(result, [1.0, 0.0, 1.0]);
  }
}
