/*!
  Masked writes: `assign` and the compound assignments. A varying destination is written only
  at the points the mask selects; the points it leaves out keep their previous contents. A
  uniform destination has no per point state for the mask to select, so it is always written.
*/

use super::{element, AssignKernel};
use crate::bytecode::{DispatchKey, Opcode, Width};
use crate::types::Storage;

pub(crate) trait AssignOperator {
  fn apply(destination: &mut f32, source: f32);
}

pub(crate) struct Assign;
pub(crate) struct AddAssign;
pub(crate) struct SubtractAssign;
pub(crate) struct MultiplyAssign;
pub(crate) struct DivideAssign;

impl AssignOperator for Assign {
  #[inline(always)]
  fn apply(destination: &mut f32, source: f32) { *destination = source; }
}

impl AssignOperator for AddAssign {
  #[inline(always)]
  fn apply(destination: &mut f32, source: f32) { *destination += source; }
}

impl AssignOperator for SubtractAssign {
  #[inline(always)]
  fn apply(destination: &mut f32, source: f32) { *destination -= source; }
}

impl AssignOperator for MultiplyAssign {
  #[inline(always)]
  fn apply(destination: &mut f32, source: f32) { *destination *= source; }
}

impl AssignOperator for DivideAssign {
  #[inline(always)]
  fn apply(destination: &mut f32, source: f32) { *destination /= source; }
}

#[inline(always)]
fn write_element<Op, const SV: bool, const D: usize, const S: usize>(
  destination : &mut [f32],
  source      : &[f32],
  i           : usize
)
  where Op: AssignOperator
{
  let s = element::<SV>(i) * S;
  for c in 0..D {
    Op::apply(&mut destination[i * D + c], source[s + if S == 1 { 0 } else { c }]);
  }
}

fn write<Op, const DV: bool, const SV: bool, const D: usize, const S: usize>(
  destination : &mut [f32],
  source      : &[f32],
  mask        : Option<&[bool]>,
  points      : usize
)
  where Op: AssignOperator
{
  if !DV {
    write_element::<Op, SV, D, S>(destination, source, 0);
    return;
  }
  match mask {
    None => {
      for i in 0..points {
        write_element::<Op, SV, D, S>(destination, source, i);
      }
    }
    Some(mask) => {
      for i in (0..points).filter(|i| mask[*i]) {
        write_element::<Op, SV, D, S>(destination, source, i);
      }
    }
  }
}

fn same_width<Op, const DV: bool, const SV: bool>(width: Width) -> AssignKernel
  where Op: AssignOperator
{
  match width {
    Width::One   => write::<Op, DV, SV, 1, 1>,
    Width::Two   => write::<Op, DV, SV, 2, 2>,
    Width::Three => write::<Op, DV, SV, 3, 3>,
    Width::Four  => write::<Op, DV, SV, 4, 4>,
  }
}

fn scalar_source<Op, const DV: bool, const SV: bool>(width: Width) -> AssignKernel
  where Op: AssignOperator
{
  match width {
    Width::One   => write::<Op, DV, SV, 1, 1>,
    Width::Two   => write::<Op, DV, SV, 2, 1>,
    Width::Three => write::<Op, DV, SV, 3, 1>,
    Width::Four  => write::<Op, DV, SV, 4, 1>,
  }
}

/// Supports UnUn, VnUn, and VnVn, and a scalar source against any width when `scalable`.
fn storages<Op: AssignOperator>(key: DispatchKey, scalable: bool) -> Option<AssignKernel> {
  let (destination, source) = key.shapes()?;
  let same = destination.width == source.width;
  let scalar = scalable && source.width == Width::One;
  if !same && !scalar {
    return None;
  }

  let storages = (destination.storage, source.storage);
  let kernel = match (storages, same) {
    ((Storage::Uniform, Storage::Uniform), true)  => same_width::<Op, false, false>(destination.width),
    ((Storage::Varying, Storage::Uniform), true)  => same_width::<Op, true, false>(destination.width),
    ((Storage::Varying, Storage::Varying), true)  => same_width::<Op, true, true>(destination.width),
    ((Storage::Uniform, Storage::Uniform), false) => scalar_source::<Op, false, false>(destination.width),
    ((Storage::Varying, Storage::Uniform), false) => scalar_source::<Op, true, false>(destination.width),
    ((Storage::Varying, Storage::Varying), false) => scalar_source::<Op, true, true>(destination.width),
    // A uniform destination cannot hold a varying result.
    ((Storage::Uniform, Storage::Varying), _)     => return None,
  };
  Some(kernel)
}

/// The kernel for `assign` or a compound assignment. Multiplication and division also accept a
/// float source scaling every component of the destination.
pub fn assign(opcode: Opcode, key: DispatchKey) -> Option<AssignKernel> {
  match opcode {
    Opcode::Assign         => storages::<Assign>(key, false),
    Opcode::AddAssign      => storages::<AddAssign>(key, false),
    Opcode::SubtractAssign => storages::<SubtractAssign>(key, false),
    Opcode::MultiplyAssign => storages::<MultiplyAssign>(key, true),
    Opcode::DivideAssign   => storages::<DivideAssign>(key, true),
    _                      => None,
  }
}
