//! Conditionals run end to end: assembly in, shaded grid out.

use reyes_vm::{
  assemble,
  Grid,
  MachineConfig,
  MachineError,
  NullRenderer,
  Value,
  VirtualMachine
};

const X_AND_Y: &str = "
  .global varying float x
  .global varying float y
";

/// Assembles `body` after the `x` and `y` declarations and shades a grid with `x` bound.
fn shade(body: &str, x: &[f32], y: Option<&[f32]>) -> (Grid, u64) {
  let shader = assemble(&format!("{}{}", X_AND_Y, body)).unwrap();
  let mut grid = Grid::with_points(x.len());
  grid.insert_value("x", Value::varying_float(x)).unwrap();
  if let Some(y) = y {
    grid.insert_value("y", Value::varying_float(y)).unwrap();
  }

  let renderer = NullRenderer;
  let mut machine = VirtualMachine::new(&renderer);
  machine.initialize(&mut grid, &shader).unwrap();
  machine.shade_in_place(&mut grid, &shader).unwrap();
  let executed = machine.instructions_executed();
  (grid, executed)
}

#[test]
fn if_writes_only_where_the_condition_holds() {
  // if ( x > 0 ) y = 1 - 2 * x;
  let (grid, _) = shade("
    .constant float 0, 1, 2
          greater.v1u1 %0, @x, #0
          generate_mask %0
          jump_empty end
          multiply.u1v1 %1, #2, @x
          subtract.u1v1 %2, #1, %1
          assign.v1v1 @y, %2
    end:  clear_mask
  ", &[1.0, -1.0, 2.0, -2.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[-1.0, 0.0, -3.0, 0.0]);
  assert_eq!(grid.floats("x").unwrap(), &[1.0, -1.0, 2.0, -2.0]);
}

#[test]
fn points_on_the_boundary_fail_a_strict_comparison() {
  // if ( x > 0 ) y = 1 - 2 * x;
  let (grid, _) = shade("
    .constant float 0, 1, 2
          greater.v1u1 %0, @x, #0
          generate_mask %0
          jump_empty end
          multiply.u1v1 %1, #2, @x
          subtract.u1v1 %2, #1, %1
          assign.v1v1 @y, %2
    end:  clear_mask
  ", &[1.0, 0.0, 1.0, 0.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[-1.0, 0.0, -1.0, 0.0]);
}

#[test]
fn nested_compound_assignments_accumulate() {
  // if ( x > 0 ) { if ( x > 0 ) y += 1 - 2 * x; y += 1 - 2 * x; }
  let (grid, _) = shade("
    .constant float 0, 1, 2
                greater.v1u1 %0, @x, #0
                generate_mask %0
                jump_empty outer_done
                greater.v1u1 %1, @x, #0
                generate_mask %1
                jump_empty inner_done
                multiply.u1v1 %2, #2, @x
                subtract.u1v1 %3, #1, %2
                add_assign.v1v1 @y, %3
    inner_done: clear_mask
                multiply.u1v1 %4, #2, @x
                subtract.u1v1 %5, #1, %4
                add_assign.v1v1 @y, %5
    outer_done: clear_mask
  ", &[1.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[-2.0]);
}

#[test]
fn arithmetic_into_a_global_respects_the_mask() {
  // if ( x > 0 ) y = x + 5;
  let (grid, _) = shade("
    .constant float 0, 5
          greater.v1u1 %0, @x, #0
          generate_mask %0
          add.v1u1 @y, @x, #1
          clear_mask
  ", &[1.0, -1.0, 1.0, -1.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[6.0, 0.0, 6.0, 0.0]);
}

#[test]
fn builtin_results_into_a_global_respect_the_mask() {
  // if ( x < 0 ) y = xcomp(vector(x));
  let (grid, _) = shade("
    .constant float 0
          less.v1u1 %0, @x, #0
          generate_mask %0
          convert.v3v1 %1, @x, vector
          call xcomp @y, %1
          clear_mask
  ", &[1.0, -2.0, 3.0, -4.0], Some(&[9.0; 4][..]));

  assert_eq!(grid.floats("y").unwrap(), &[9.0, -2.0, 9.0, -4.0]);
}

#[test]
fn else_runs_under_the_inverted_mask() {
  // if ( x > 0 ) y = x; else y = -x;
  let (grid, _) = shade("
    .constant float 0
          greater.v1u1 %0, @x, #0
          generate_mask %0
          jump_empty else
          assign.v1v1 @y, @x
    else: invert_mask
          jump_empty done
          negate.v1 %1, @x
          assign.v1v1 @y, %1
    done: clear_mask
  ", &[1.0, -1.0, 2.0, -2.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[1.0, 1.0, 2.0, 2.0]);
}

#[test]
fn nested_conditionals_compose_their_masks() {
  // if ( x > 0 ) { y = 2 * x; if ( x > 1 ) y = 100; }
  // else         { y = x;     if ( x < -2 ) y = y - 1; }
  let (grid, _) = shade("
    .constant float 0, 2, 1, 100, -2
                greater.v1u1 %0, @x, #0
                generate_mask %0
                jump_empty else
                multiply.v1u1 %1, @x, #1
                assign.v1v1 @y, %1
                greater.v1u1 %2, @x, #2
                generate_mask %2
                jump_empty inner_done
                assign.v1u1 @y, #3
    inner_done: clear_mask
    else:       invert_mask
                jump_empty done
                assign.v1v1 @y, @x
                less.v1u1 %3, @x, #4
                generate_mask %3
                jump_empty else_done
                subtract.v1u1 %4, @y, #2
                assign.v1v1 @y, %4
    else_done:  clear_mask
    done:       clear_mask
  ", &[2.0, 1.0, -1.0, -3.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[100.0, 2.0, -1.0, -4.0]);
}

#[test]
fn uniform_conditions_select_every_point() {
  // if ( k > 0 ) y = x; else y = -x;
  let (grid, _) = shade("
    .parameter uniform float k 1
    .constant float 0
          greater.u1u1 %0, @k, #0
          generate_mask %0
          jump_empty else
          assign.v1v1 @y, @x
    else: invert_mask
          jump_empty done
          negate.v1 %1, @x
          assign.v1v1 @y, %1
    done: clear_mask
  ", &[3.0, -4.0, 5.0], None);

  assert_eq!(grid.floats("y").unwrap(), &[3.0, -4.0, 5.0]);
}

#[test]
fn compound_assignment_respects_the_mask() {
  // if ( x > 0 ) y += x; else y -= x;
  let (grid, _) = shade("
    .constant float 0
          greater.v1u1 %0, @x, #0
          generate_mask %0
          jump_empty else
          add_assign.v1v1 @y, @x
    else: invert_mask
          jump_empty done
          subtract_assign.v1v1 @y, @x
    done: clear_mask
  ", &[1.0, -1.0, 2.0, -2.0], Some(&[10.0; 4][..]));

  assert_eq!(grid.floats("y").unwrap(), &[11.0, 11.0, 12.0, 12.0]);
}

#[test]
fn empty_masks_skip_their_blocks() {
  // if ( x > 0 ) { if ( x > 1 ) y = 5; y = 3; }
  let (grid, executed) = shade("
    .constant float 0, 1, 5, 3
                greater.v1u1 %0, @x, #0
                generate_mask %0
                jump_empty outer_done
                greater.v1u1 %1, @x, #1
                generate_mask %1
                jump_empty inner_done
                assign.v1u1 @y, #2
    inner_done: clear_mask
                assign.v1u1 @y, #3
    outer_done: clear_mask
  ", &[-1.0, -2.0], Some(&[-1.0, -1.0][..]));

  assert_eq!(grid.floats("y").unwrap(), &[-1.0, -1.0]);
  assert_eq!(executed, 4);
}

#[test]
fn loops_stop_at_the_instruction_limit() {
  let shader = assemble("top: jump top").unwrap();
  let renderer = NullRenderer;
  let config = MachineConfig::default().with_instruction_limit(100);
  let mut machine = VirtualMachine::with_config(&renderer, config);
  let mut grid = Grid::new(2, 2);

  assert_eq!(
    machine.shade_in_place(&mut grid, &shader),
    Err(MachineError::InstructionLimit { limit: 100 })
  );
}

#[test]
fn one_machine_shades_many_grids() {
  let shader = assemble(&format!("{}{}", X_AND_Y, "
    .constant float 2
    multiply.v1u1 %0, @x, #0
    assign.v1v1 @y, %0
  ")).unwrap();
  let renderer = NullRenderer;
  let mut machine = VirtualMachine::new(&renderer);

  for points in 1..4 {
    let x: Vec<f32> = (0..points).map(|i| i as f32).collect();
    let mut input = Grid::with_points(points);
    input.insert_value("x", Value::varying_float(&x)).unwrap();
    let mut output = Grid::with_points(points);
    machine.shade(&input, &mut output, &shader).unwrap();

    let doubled: Vec<f32> = x.iter().map(|x| 2.0 * x).collect();
    assert_eq!(output.floats("y").unwrap(), doubled.as_slice());
    assert!(input.value("y").is_none());
  }
}
