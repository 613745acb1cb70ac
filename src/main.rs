//! Assembles a shader, runs it over a grid, and prints the grid.
//!
//! ```text
//! reyes-vm shader.s --grid 4x1 --value x=1,-1,2,-2
//! RUST_LOG=trace reyes-vm shader.s --grid 2x2
//! ```

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use glam::Vec3;
use tracing::error;

use reyes_vm::{
  assemble,
  disassemble,
  Grid,
  MachineConfig,
  Shader,
  SpaceTable,
  Storage,
  Value,
  ValueType,
  VirtualMachine
};

#[derive(Parser)]
#[command(name = "reyes-vm")]
#[command(about = "Runs shader assembly over a grid of shading points", long_about = None)]
struct Cli {
  /// Shader assembly file
  assembly: PathBuf,

  /// Grid dimensions as WIDTHxHEIGHT
  #[arg(short, long, default_value = "4x1", value_parser = parse_dimensions)]
  grid: (usize, usize),

  /// Binds a grid value, as NAME=C0,C1,... One element makes a uniform value.
  #[arg(short, long = "value", value_parser = parse_binding)]
  values: Vec<(String, Vec<f32>)>,

  /// Stops after this many instructions
  #[arg(short, long)]
  limit: Option<u64>,

  /// Prints the assembled shader instead of running it
  #[arg(short, long)]
  disassemble: bool,
}

fn parse_dimensions(text: &str) -> Result<(usize, usize), String> {
  let (width, height) = text.split_once('x')
                            .ok_or_else(|| format!("`{}` is not WIDTHxHEIGHT", text))?;
  let width  = width.trim().parse::<usize>().map_err(|e| e.to_string())?;
  let height = height.trim().parse::<usize>().map_err(|e| e.to_string())?;
  Ok((width, height))
}

fn parse_binding(text: &str) -> Result<(String, Vec<f32>), String> {
  let (name, components) = text.split_once('=')
                               .ok_or_else(|| format!("`{}` is not NAME=VALUES", text))?;
  let components = components.split(',')
                             .map(|c| c.trim().parse::<f32>().map_err(|e| e.to_string()))
                             .collect::<Result<Vec<f32>, String>>()?;
  Ok((name.trim().to_string(), components))
}

/// Builds a grid value for the symbol `name` declares from a flat list of components.
fn make_value(shader: &Shader, points: usize, name: &str, components: &[f32])
  -> Result<Value, String>
{
  let symbol = shader.symbols
                     .lookup(name)
                     .ok_or_else(|| format!("`{}` is not a symbol of `{}`", name, shader.name))?;
  let width = symbol.ty.components();
  if width == 0 || components.len() % width != 0 {
    return Err(format!("`{}` is a {} and cannot take {} numbers", name, symbol.ty, components.len()));
  }

  let count   = components.len() / width;
  let storage = match count {
    1                 => Storage::Uniform,
    n if n == points  => Storage::Varying,
    n => return Err(format!("`{}` has {} elements but the grid has {} points", name, n, points)),
  };
  let mut value = Value::new(symbol.ty, storage, count);
  match symbol.ty {
    ValueType::Float | ValueType::Matrix => value.floats_mut().copy_from_slice(components),
    _ => {
      for (i, element) in components.chunks(3).enumerate() {
        value.set_vec3(i, Vec3::from_slice(element));
      }
    }
  }
  Ok(value)
}

fn run(cli: Cli) -> Result<(), String> {
  let text = fs::read_to_string(&cli.assembly)
    .map_err(|e| format!("cannot read {}: {}", cli.assembly.display(), e))?;
  let shader = assemble(&text).map_err(|e| e.to_string())?;

  if cli.disassemble {
    print!("{}", disassemble(&shader));
    return Ok(());
  }

  let (width, height) = cli.grid;
  let mut grid = Grid::new(width, height);
  for (name, components) in cli.values.iter() {
    let value = make_value(&shader, grid.point_count(), name, components)?;
    grid.insert_value(name, value).map_err(|e| e.to_string())?;
  }

  let mut config = MachineConfig::default();
  if let Some(limit) = cli.limit {
    config = config.with_instruction_limit(limit);
  }
  let renderer    = SpaceTable::new();
  let mut machine = VirtualMachine::with_config(&renderer, config);
  machine.initialize(&mut grid, &shader).map_err(|e| e.to_string())?;
  machine.shade_in_place(&mut grid, &shader).map_err(|e| e.to_string())?;

  println!("{}", grid);
  println!("{} instructions executed", machine.instructions_executed());
  Ok(())
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .init();

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  if let Err(message) = run(Cli::parse()) {
    error!("{}", message);
    eprintln!("Error: {}", message);
    process::exit(1);
  }
}
