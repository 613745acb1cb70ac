/*!
  The operation kernel library. Each kernel is a monomorphized instance of a generic function
  whose const parameters fix the storage of its operands (`true` for varying) and their element
  widths. The lookup functions map an opcode's dispatch key to the matching instance with an
  exhaustive match; `None` means the code generator emitted a combination the opcode does not
  support.

  Kernels work on flat float buffers. Uniform operands are read at element zero for every
  point, so a varying result may be computed from any mix of storages. When every operand is
  uniform a kernel touches exactly one element.
*/

mod arithmetic;
mod assign;
mod compare;
mod convert;
mod function;
mod geometric;

pub use arithmetic::{binary, negate, transform};
pub use assign::assign;
pub use compare::{compare, logical};
pub use convert::{convert, promote};
pub use function::Function;

use crate::renderer::Renderer;
use crate::value::Value;

/// `result = lhs op rhs` over `points` points.
pub type BinaryKernel = fn(result: &mut [f32], lhs: &[f32], rhs: &[f32], points: usize);

/// `result = op operand` over `points` points.
pub type UnaryKernel = fn(result: &mut [f32], operand: &[f32], points: usize);

/// `destination op= source` at the points the mask selects.
pub type AssignKernel =
  fn(destination: &mut [f32], source: &[f32], mask: Option<&[bool]>, points: usize);

/// `result = matrix * point` over `points` points. The matrix is always uniform.
pub type TransformKernel = fn(result: &mut [f32], matrix: &[f32], point: &[f32], points: usize);

/// A builtin function. Arguments that are outputs (`fresnel`'s `Kr` and `Kt`) are written in
/// place; everything else is read only.
pub type FunctionKernel = fn(context: &CallContext, result: &mut Value, arguments: &mut [Value]);

/// What a builtin function can see of the machine besides its arguments.
pub struct CallContext<'a> {
  pub renderer : &'a dyn Renderer,
  pub width    : usize,
  pub height   : usize,
  pub points   : usize,
  pub mask     : Option<&'a [bool]>,
}

impl<'a> CallContext<'a> {
  /// True if point `i` is to be written.
  pub fn is_active(&self, i: usize) -> bool {
    match self.mask {
      Some(mask) => mask[i],
      None       => true,
    }
  }
}

/// Index of point `i`'s element in an operand of the given storage.
#[inline(always)]
pub(crate) fn element<const VARYING: bool>(i: usize) -> usize {
  match VARYING {
    true  => i,
    false => 0,
  }
}

/// The number of elements a kernel writes: one if every operand is uniform.
#[inline(always)]
pub(crate) fn element_count(any_varying: bool, points: usize) -> usize {
  match any_varying {
    true  => points,
    false => 1,
  }
}

