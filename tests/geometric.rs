//! Builtin function calls run end to end.

use glam::{Mat4, Vec3};

use reyes_vm::{
  assemble,
  Grid,
  Renderer,
  SpaceTable,
  Value,
  ValueType,
  VirtualMachine
};

const TOLERANCE: f32 = 0.0001;

fn close(a: Vec3, b: Vec3) -> bool {
  (a - b).length() < TOLERANCE
}

fn run(renderer: &dyn Renderer, text: &str, grid: &mut Grid) {
  let shader = assemble(text).unwrap();
  let mut machine = VirtualMachine::new(renderer);
  machine.initialize(grid, &shader).unwrap();
  machine.shade_in_place(grid, &shader).unwrap();
}

#[test]
fn lengths_directions_and_spaces() {
  let renderer = SpaceTable::new().with_space("world", Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
  let mut grid = Grid::new(2, 1);
  grid.insert_value("N", Value::varying_vec3(
    ValueType::Vector,
    &[Vec3::new(3.0, 4.0, 0.0), Vec3::new(0.0, 0.0, 2.0)]
  )).unwrap();
  grid.insert_value("P", Value::varying_vec3(
    ValueType::Point,
    &[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)]
  )).unwrap();

  run(&renderer, "
    .global varying vector N
    .global varying point P
    .global varying float len
    .global varying vector Nn
    .global varying point Pw
    .constant string \"world\"

    call length %0, @N
    assign.v1v1 @len, %0
    call normalize %1, @N
    assign.v3v3 @Nn, %1
    call transform %2, #0, @P
    assign.v3v3 @Pw, %2
  ", &mut grid);

  assert_eq!(grid.floats("len").unwrap(), &[5.0, 2.0]);
  let nn = grid.value("Nn").unwrap();
  assert!(close(nn.vec3(0), Vec3::new(0.6, 0.8, 0.0)));
  assert!(close(nn.vec3(1), Vec3::Z));
  let pw = grid.value("Pw").unwrap();
  assert_eq!(pw.ty(), ValueType::Point);
  assert!(close(pw.vec3(0), Vec3::new(1.0, 0.0, 5.0)));
  assert!(close(pw.vec3(1), Vec3::new(0.0, 1.0, 5.0)));
}

#[test]
fn fresnel_writes_its_outputs_under_the_mask() {
  let renderer = SpaceTable::new();
  let mut grid = Grid::new(3, 1);
  grid.insert_value("I", Value::uniform_vec3(ValueType::Vector, Vec3::new(0.0, 0.0, -1.0))).unwrap();
  grid.insert_value("N", Value::uniform_vec3(ValueType::Normal, Vec3::Z)).unwrap();
  grid.insert_value("x", Value::varying_float(&[1.0, -1.0, 1.0])).unwrap();

  // if ( x > 0 ) fresnel(I, N, 1.5, Kr, Kt);
  run(&renderer, "
    .global varying vector I
    .global varying normal N
    .global varying float x
    .global varying float Kr
    .global varying float Kt
    .constant float 1.5, 0

    greater.v1u1 %1, @x, #1
    generate_mask %1
    call fresnel %0, @I, @N, #0, @Kr, @Kt
    clear_mask
  ", &mut grid);

  let kr = grid.floats("Kr").unwrap();
  let kt = grid.floats("Kt").unwrap();
  assert!((kr[0] - 0.04).abs() < TOLERANCE);
  assert!((kt[0] - 0.96).abs() < TOLERANCE);
  assert_eq!((kr[1], kt[1]), (0.0, 0.0));
  assert_eq!(kr[0], kr[2]);
}

#[test]
fn derivatives_and_normals_over_a_grid() {
  let renderer = SpaceTable::new();
  let mut grid = Grid::new(2, 2);
  grid.insert_value("P", Value::varying_vec3(ValueType::Point, &[
    Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(0.0, 3.0, 0.0), Vec3::new(2.0, 3.0, 0.0),
  ])).unwrap();

  run(&renderer, "
    .global varying point P
    .global varying normal Ng
    .global varying float dPdu_x
    .global varying float a

    call calculatenormal %0, @P
    assign.v3v3 @Ng, %0
    call du %1, @P
    call xcomp %2, %1
    assign.v1v1 @dPdu_x, %2
    call area %3, @P
    assign.v1v1 @a, %3
  ", &mut grid);

  let ng = grid.value("Ng").unwrap();
  assert_eq!(ng.ty(), ValueType::Normal);
  for i in 0..4 {
    assert!(close(ng.vec3(i).normalize(), -Vec3::Z));
  }
  assert_eq!(grid.floats("dPdu_x").unwrap(), &[2.0, 2.0, 2.0, 2.0]);
  assert_eq!(grid.floats("a").unwrap(), &[6.0, 6.0, 6.0, 6.0]);
}
