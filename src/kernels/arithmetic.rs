//! `add`, `subtract`, `multiply`, `divide`, `negate`, and the `transform` opcode.

use glam::{Mat4, Vec3};

use super::{element, element_count, BinaryKernel, TransformKernel, UnaryKernel};
use crate::bytecode::{DispatchKey, Opcode, Width};
use crate::types::Storage;

pub(crate) trait BinaryOperator {
  fn apply(lhs: f32, rhs: f32) -> f32;
}

pub(crate) struct Add;
pub(crate) struct Subtract;
pub(crate) struct Multiply;
pub(crate) struct Divide;

impl BinaryOperator for Add {
  #[inline(always)]
  fn apply(lhs: f32, rhs: f32) -> f32 { lhs + rhs }
}

impl BinaryOperator for Subtract {
  #[inline(always)]
  fn apply(lhs: f32, rhs: f32) -> f32 { lhs - rhs }
}

impl BinaryOperator for Multiply {
  #[inline(always)]
  fn apply(lhs: f32, rhs: f32) -> f32 { lhs * rhs }
}

impl BinaryOperator for Divide {
  #[inline(always)]
  fn apply(lhs: f32, rhs: f32) -> f32 { lhs / rhs }
}

/**
  Applies `Op` componentwise. The result has `max(L, R)` components; an operand of width one is
  broadcast across the components of the other.
*/
fn zip<Op, const LV: bool, const RV: bool, const L: usize, const R: usize>(
  result : &mut [f32],
  lhs    : &[f32],
  rhs    : &[f32],
  points : usize
)
  where Op: BinaryOperator
{
  let width = if L > R { L } else { R };
  for i in 0..element_count(LV || RV, points) {
    let l = element::<LV>(i) * L;
    let r = element::<RV>(i) * R;
    for c in 0..width {
      let a = lhs[l + if L == 1 { 0 } else { c }];
      let b = rhs[r + if R == 1 { 0 } else { c }];
      result[i * width + c] = Op::apply(a, b);
    }
  }
}

fn widths<Op, const LV: bool, const RV: bool>(lhs: Width, rhs: Width) -> Option<BinaryKernel>
  where Op: BinaryOperator
{
  let kernel: BinaryKernel =
    match (lhs, rhs) {
      (Width::One,   Width::One)   => zip::<Op, LV, RV, 1, 1>,
      (Width::Two,   Width::Two)   => zip::<Op, LV, RV, 2, 2>,
      (Width::Three, Width::Three) => zip::<Op, LV, RV, 3, 3>,
      (Width::Four,  Width::Four)  => zip::<Op, LV, RV, 4, 4>,
      (Width::One,   Width::Two)   => zip::<Op, LV, RV, 1, 2>,
      (Width::One,   Width::Three) => zip::<Op, LV, RV, 1, 3>,
      (Width::One,   Width::Four)  => zip::<Op, LV, RV, 1, 4>,
      (Width::Two,   Width::One)   => zip::<Op, LV, RV, 2, 1>,
      (Width::Three, Width::One)   => zip::<Op, LV, RV, 3, 1>,
      (Width::Four,  Width::One)   => zip::<Op, LV, RV, 4, 1>,
      _ => return None,
    };
  Some(kernel)
}

fn storages<Op: BinaryOperator>(key: DispatchKey) -> Option<BinaryKernel> {
  let (lhs, rhs) = key.shapes()?;
  match (lhs.storage, rhs.storage) {
    (Storage::Uniform, Storage::Uniform) => widths::<Op, false, false>(lhs.width, rhs.width),
    (Storage::Uniform, Storage::Varying) => widths::<Op, false, true>(lhs.width, rhs.width),
    (Storage::Varying, Storage::Uniform) => widths::<Op, true, false>(lhs.width, rhs.width),
    (Storage::Varying, Storage::Varying) => widths::<Op, true, true>(lhs.width, rhs.width),
  }
}

/// The kernel for an arithmetic opcode with operand shapes `key`.
pub fn binary(opcode: Opcode, key: DispatchKey) -> Option<BinaryKernel> {
  match opcode {
    Opcode::Add      => storages::<Add>(key),
    Opcode::Subtract => storages::<Subtract>(key),
    Opcode::Multiply => storages::<Multiply>(key),
    Opcode::Divide   => storages::<Divide>(key),
    _                => None,
  }
}

fn negate_n<const V: bool, const N: usize>(result: &mut [f32], operand: &[f32], points: usize) {
  for i in 0..element_count(V, points) {
    for c in 0..N {
      result[i * N + c] = -operand[i * N + c];
    }
  }
}

fn negate_widths<const V: bool>(width: Width) -> UnaryKernel {
  match width {
    Width::One   => negate_n::<V, 1>,
    Width::Two   => negate_n::<V, 2>,
    Width::Three => negate_n::<V, 3>,
    Width::Four  => negate_n::<V, 4>,
  }
}

/// The kernel for `negate`, keyed by the operand's single shape.
pub fn negate(key: DispatchKey) -> Option<UnaryKernel> {
  let shape = key.shape()?;
  Some(match shape.storage {
    Storage::Uniform => negate_widths::<false>(shape.width),
    Storage::Varying => negate_widths::<true>(shape.width),
  })
}

fn transform_points<const V: bool>(
  result : &mut [f32],
  matrix : &[f32],
  point  : &[f32],
  points : usize
) {
  let mut columns = [0.0f32; 16];
  columns.copy_from_slice(&matrix[..16]);
  let matrix = Mat4::from_cols_array(&columns);

  for i in 0..element_count(V, points) {
    let p = Vec3::from_slice(&point[i * 3..i * 3 + 3]);
    let q = (matrix * p.extend(1.0)).truncate();
    result[i * 3..i * 3 + 3].copy_from_slice(&q.to_array());
  }
}

/// The kernel for the `transform` opcode, keyed by the point operand's single shape.
pub fn transform(key: DispatchKey) -> Option<TransformKernel> {
  let shape = key.shape()?;
  let kernel: TransformKernel =
    match (shape.storage, shape.width) {
      (Storage::Uniform, Width::Three) => transform_points::<false>,
      (Storage::Varying, Width::Three) => transform_points::<true>,
      _ => return None,
    };
  Some(kernel)
}
