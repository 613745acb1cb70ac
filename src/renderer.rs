/*!
  The renderer is the machine's only collaborator while a shader runs. It answers questions
  the shader cannot answer from the grid alone: how to get from one coordinate system to
  another, where a point lands in raster space, and which way the geometry is wound. It may
  also evaluate other shaders (lights, for instance) on the machine's behalf.
*/

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use string_cache::DefaultAtom;
use tracing::warn;

use crate::symboltable::SymbolTable;
use crate::value::Value;

/// The symbols of the running shader, exposed to `Renderer::evaluate` by name.
pub struct Bindings<'a> {
  symbols : &'a SymbolTable,
  values  : &'a mut [Value],
}

impl<'a> Bindings<'a> {
  pub fn new(symbols: &'a SymbolTable, values: &'a mut [Value]) -> Bindings<'a> {
    Bindings { symbols, values }
  }

  pub fn value(&self, name: &str) -> Option<&Value> {
    let slot = self.symbols.get_slot(name)?;
    self.values.get(slot)
  }

  pub fn value_mut(&mut self, name: &str) -> Option<&mut Value> {
    let slot = self.symbols.get_slot(name)?;
    self.values.get_mut(slot)
  }
}

pub trait Renderer: Sync {
  /// The matrix taking current space to `space`.
  fn transform_to(&self, space: &str) -> Mat4;

  /// The matrix taking `space` to current space.
  fn transform_from(&self, space: &str) -> Mat4;

  /// The matrix taking `from` space to `to` space.
  fn transform_between(&self, from: &str, to: &str) -> Mat4 {
    self.transform_to(to) * self.transform_from(from)
  }

  /// Projects a current space point into raster space.
  fn raster(&self, point: Vec3) -> Vec3;

  fn geometry_left_handed(&self) -> bool {
    false
  }

  /// Evaluates the named shader against the running shader's symbols.
  fn evaluate(&self, _shader: &str, _bindings: &mut Bindings) {}
}

/// A renderer whose every space is current space.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
  fn transform_to(&self, _space: &str) -> Mat4 {
    Mat4::IDENTITY
  }

  fn transform_from(&self, _space: &str) -> Mat4 {
    Mat4::IDENTITY
  }

  fn raster(&self, point: Vec3) -> Vec3 {
    point
  }
}

/**
  A renderer backed by a table of named coordinate systems. Each entry is the matrix taking
  current space to the named space. `"current"` is always the identity.
*/
#[derive(Clone, Debug)]
pub struct SpaceTable {
  spaces      : HashMap<DefaultAtom, Mat4>,
  projection  : Mat4,
  left_handed : bool,
}

impl Default for SpaceTable {
  fn default() -> SpaceTable {
    SpaceTable::new()
  }
}

impl SpaceTable {
  pub fn new() -> SpaceTable {
    let mut spaces = HashMap::new();
    spaces.insert(DefaultAtom::from("current"), Mat4::IDENTITY);
    SpaceTable {
      spaces,
      projection  : Mat4::IDENTITY,
      left_handed : false,
    }
  }

  /// Adds a space given the matrix from current space to it.
  pub fn with_space(mut self, name: &str, to_space: Mat4) -> SpaceTable {
    self.spaces.insert(DefaultAtom::from(name), to_space);
    self
  }

  /// Sets the projection from current space to raster space.
  pub fn with_projection(mut self, projection: Mat4) -> SpaceTable {
    self.projection = projection;
    self
  }

  pub fn with_left_handed(mut self, left_handed: bool) -> SpaceTable {
    self.left_handed = left_handed;
    self
  }

  fn space(&self, name: &str) -> Mat4 {
    match self.spaces.get(&DefaultAtom::from(name)) {
      Some(matrix) => *matrix,
      None => {
        warn!(space = name, "unknown coordinate system, using the identity");
        Mat4::IDENTITY
      }
    }
  }
}

impl Renderer for SpaceTable {
  fn transform_to(&self, space: &str) -> Mat4 {
    self.space(space)
  }

  fn transform_from(&self, space: &str) -> Mat4 {
    self.space(space).inverse()
  }

  fn raster(&self, point: Vec3) -> Vec3 {
    self.projection.project_point3(point)
  }

  fn geometry_left_handed(&self) -> bool {
    self.left_handed
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spaces_compose_through_current() {
    let world = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
    let camera = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let spaces = SpaceTable::new().with_space("world", world).with_space("camera", camera);

    let p = spaces.transform_between("world", "camera").transform_point3(Vec3::ZERO);
    assert!((p - Vec3::new(-1.0, 2.0, 0.0)).length() < 1e-5);
    assert_eq!(spaces.transform_to("current"), Mat4::IDENTITY);
    assert_eq!(spaces.transform_to("nowhere"), Mat4::IDENTITY);
  }

  #[test]
  fn raster_applies_the_projection() {
    let spaces = SpaceTable::new().with_projection(Mat4::from_scale(Vec3::splat(2.0)));
    assert_eq!(spaces.raster(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(2.0, 4.0, 6.0));
    assert!(!spaces.geometry_left_handed());
  }
}
