//! Data movement opcodes and the renderer callback, run end to end.

use glam::{Mat4, Vec3};

use reyes_vm::{
  assemble,
  Bindings,
  Grid,
  MachineError,
  Renderer,
  Storage,
  Value,
  ValueType,
  VirtualMachine
};

/// Lights every point red when asked to evaluate `light`.
struct RedLight;

impl Renderer for RedLight {
  fn transform_to(&self, _space: &str) -> Mat4 {
    Mat4::IDENTITY
  }

  fn transform_from(&self, _space: &str) -> Mat4 {
    Mat4::IDENTITY
  }

  fn raster(&self, point: Vec3) -> Vec3 {
    point
  }

  fn evaluate(&self, shader: &str, bindings: &mut Bindings) {
    if shader != "light" {
      return;
    }
    if let Some(cl) = bindings.value_mut("Cl") {
      for i in 0..cl.size() {
        cl.set_vec3(i, Vec3::X);
      }
    }
  }
}

fn shade(text: &str, grid: &mut Grid) -> Result<(), MachineError> {
  let shader = assemble(text).unwrap();
  let mut machine = VirtualMachine::new(&RedLight);
  machine.initialize(grid, &shader)?;
  machine.shade_in_place(grid, &shader)
}

#[test]
fn evaluate_hands_the_symbols_to_the_renderer() {
  let mut grid = Grid::new(2, 2);
  shade("
    .global varying color Cl
    .global varying color Ci
    .constant string \"light\", \"shadow\"
    evaluate #1
    evaluate #0
    assign.v3v3 @Ci, @Cl
  ", &mut grid).unwrap();

  let ci = grid.value("Ci").unwrap();
  assert!((0..4).all(|i| ci.vec3(i) == Vec3::X));
}

#[test]
fn promote_and_convert_reshape_operands() {
  let mut grid = Grid::with_points(3);
  grid.insert_value("x", Value::varying_float(&[1.0, 2.0, 3.0])).unwrap();
  shade("
    .global varying float x
    .global varying color C
    .parameter uniform float k 10

    promote.v1u1 %0, @k
    add.v1v1 %1, %0, @x
    convert.v3v1 %2, %1, color
    assign.v3v3 @C, %2
  ", &mut grid).unwrap();

  let c = grid.value("C").unwrap();
  assert_eq!(c.ty(), ValueType::Color);
  assert_eq!(c.vec3(0), Vec3::splat(11.0));
  assert_eq!(c.vec3(2), Vec3::splat(13.0));
}

#[test]
fn transform_applies_a_matrix_to_points() {
  let mut grid = Grid::with_points(2);
  grid.insert_value("P", Value::varying_vec3(ValueType::Point, &[Vec3::ZERO, Vec3::ONE])).unwrap();
  shade("
    .global varying point P
    .constant matrix 1 0 0 0  0 1 0 0  0 0 1 0  1 2 3 1
    transform.v3 %0, #0, @P
    assign.v3v3 @P, %0
  ", &mut grid).unwrap();

  let p = grid.value("P").unwrap();
  assert_eq!(p.vec3(0), Vec3::new(1.0, 2.0, 3.0));
  assert_eq!(p.vec3(1), Vec3::new(2.0, 3.0, 4.0));
}

#[test]
fn halt_stops_before_the_end() {
  let mut grid = Grid::with_points(2);
  shade("
    .global varying float y
    .constant float 7, 9
    assign.v1u1 @y, #0
    reset
    halt
    assign.v1u1 @y, #1
  ", &mut grid).unwrap();

  assert_eq!(grid.floats("y").unwrap(), &[7.0, 7.0]);
}

#[test]
fn grid_values_must_match_their_symbols() {
  let text = "
    .global varying color Cs
    .parameter uniform float Kd 0.5
  ";

  let mut grid = Grid::with_points(2);
  grid.insert_value("Cs", Value::varying_float(&[0.0, 1.0])).unwrap();
  assert_eq!(
    shade(text, &mut grid),
    Err(MachineError::TypeMismatch {
      name     : "Cs".to_string(),
      expected : ValueType::Color,
      actual   : ValueType::Float,
    })
  );

  let mut grid = Grid::with_points(2);
  grid.insert_value("Kd", Value::varying_float(&[0.0, 1.0])).unwrap();
  assert_eq!(
    shade(text, &mut grid),
    Err(MachineError::StorageMismatch {
      name     : "Kd".to_string(),
      expected : Storage::Uniform,
      actual   : Storage::Varying,
    })
  );
}
