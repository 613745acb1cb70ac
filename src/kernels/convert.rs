//! `promote` (uniform to varying) and `convert` (one element type to another).

use super::{element, element_count, UnaryKernel};
use crate::bytecode::{DispatchKey, Width};
use crate::types::Storage;

/// Copies `source` into `result`, broadcasting a uniform source across the points and a float
/// source across the components of a wider result.
fn copy<const RV: bool, const SV: bool, const R: usize, const S: usize>(
  result : &mut [f32],
  source : &[f32],
  points : usize
) {
  for i in 0..element_count(RV, points) {
    let s = element::<SV>(i) * S;
    for c in 0..R {
      result[i * R + c] = source[s + if S == 1 { 0 } else { c }];
    }
  }
}

fn same_width<const RV: bool, const SV: bool>(width: Width) -> UnaryKernel {
  match width {
    Width::One   => copy::<RV, SV, 1, 1>,
    Width::Two   => copy::<RV, SV, 2, 2>,
    Width::Three => copy::<RV, SV, 3, 3>,
    Width::Four  => copy::<RV, SV, 4, 4>,
  }
}

fn scalar_source<const RV: bool, const SV: bool>(width: Width) -> UnaryKernel {
  match width {
    Width::One   => copy::<RV, SV, 1, 1>,
    Width::Two   => copy::<RV, SV, 2, 1>,
    Width::Three => copy::<RV, SV, 3, 1>,
    Width::Four  => copy::<RV, SV, 4, 1>,
  }
}

/// The kernel for `promote`, which takes a VnUn key: the result is the varying broadcast of a
/// uniform operand of the same width.
pub fn promote(key: DispatchKey) -> Option<UnaryKernel> {
  let (result, source) = key.shapes()?;
  match (result.storage, source.storage) {
    (Storage::Varying, Storage::Uniform) if result.width == source.width => {
      Some(same_width::<true, false>(result.width))
    }
    _ => None,
  }
}

/**
  The kernel for `convert`. The result keeps the operand's storage; its width either matches
  the operand's or the operand is a float broadcast to every component.
*/
pub fn convert(key: DispatchKey) -> Option<UnaryKernel> {
  let (result, source) = key.shapes()?;
  if result.storage != source.storage {
    return None;
  }
  let varying = result.storage.is_varying();
  match (result.width == source.width, source.width, varying) {
    (true,  _,          false) => Some(same_width::<false, false>(result.width)),
    (true,  _,          true)  => Some(same_width::<true, true>(result.width)),
    (false, Width::One, false) => Some(scalar_source::<false, false>(result.width)),
    (false, Width::One, true)  => Some(scalar_source::<true, true>(result.width)),
    _ => None,
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn key(text: &str) -> DispatchKey {
    text.parse().unwrap()
  }

  #[test]
  fn promote_broadcasts_over_points() {
    let kernel = promote(key("v3u3")).unwrap();
    let mut result = [0.0; 6];
    kernel(&mut result, &[1.0, 2.0, 3.0], 2);
    assert_eq!(result, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    assert!(promote(key("u1u1")).is_none());
    assert!(promote(key("v3u1")).is_none());
  }

  #[test]
  fn convert_broadcasts_floats_to_triples() {
    let kernel = convert(key("v3v1")).unwrap();
    let mut result = [0.0; 6];
    kernel(&mut result, &[0.5, 2.0], 2);
    assert_eq!(result, [0.5, 0.5, 0.5, 2.0, 2.0, 2.0]);
  }

  #[test]
  fn convert_keeps_storage() {
    assert!(convert(key("v3u3")).is_none());
    assert!(convert(key("u1u3")).is_none());
    let kernel = convert(key("u3u3")).unwrap();
    let mut result = [0.0; 3];
    kernel(&mut result, &[1.0, 2.0, 3.0], 5);
    assert_eq!(result, [1.0, 2.0, 3.0]);
  }
}
