/*!
  The virtual machine executes a compiled shader over every point of a grid at once. Each
  instruction runs one kernel across the whole grid, so the per instruction work of decoding
  and choosing a kernel is paid once per grid rather than once per point. Divergent control
  flow is handled by the masking stack: both sides of a conditional execute, and writes into
  varying values only land at the points the top of the stack marks active.

  A machine is reusable. `shade` resets the instruction pointer, mask stack, and temporaries
  before each run and keeps their allocations between runs.

  Malformed code (an undecodable word, an operand shape the key does not describe, a key the
  opcode has no kernel for) is a bug in the code generator, not a condition a caller can
  handle, so the machine panics on it. Problems with the grid a caller supplies are reported
  as `MachineError`s.
*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::mem;

use prettytable::Table;
use string_cache::DefaultAtom;
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::bytecode::{instruction_size, try_decode_instruction, Instruction, Opcode, Shape};
use crate::config::MachineConfig;
use crate::error::MachineError;
use crate::grid::Grid;
use crate::kernels::{self, CallContext, Function};
use crate::mask::MaskStack;
use crate::renderer::{Bindings, Renderer};
use crate::shader::Shader;
use crate::symboltable::{Symbol, SymbolKind};
use crate::table::TABLE_DISPLAY_FORMAT;
use crate::types::{Storage, ValueType};
use crate::value::Value;

/// What to do after an instruction.
enum Flow {
  Next,
  Jump(usize),
  Halt,
}

/// The values the code addresses besides its constants.
#[derive(Default)]
struct Registers {
  symbols     : Vec<Value>,
  temporaries : Vec<Value>,
}

impl Registers {
  fn read<'a>(&'a self, constants: &'a [Value], address: Address) -> &'a Value {
    match address {
      Address::Constant(_)  => &constants[address.idx()],
      Address::Symbol(_)    => &self.symbols[address.idx()],
      Address::Temporary(_) => &self.temporaries[address.idx()],
    }
  }

  /// Moves a writable value out of its register, leaving an empty value behind.
  fn take(&mut self, address: Address) -> Value {
    address.require_writable();
    match address {
      Address::Symbol(_)    => mem::take(&mut self.symbols[address.idx()]),
      Address::Temporary(_) => mem::take(&mut self.temporaries[address.idx()]),
      Address::Constant(_)  => unreachable!(),
    }
  }

  fn put(&mut self, address: Address, value: Value) {
    match address {
      Address::Symbol(_)    => self.symbols[address.idx()] = value,
      Address::Temporary(_) => self.temporaries[address.idx()] = value,
      Address::Constant(_)  => unreachable!(),
    }
  }

  /// Empties every temporary, keeping their buffers.
  fn clear_temporaries(&mut self, count: usize) {
    if self.temporaries.len() < count {
      self.temporaries.resize_with(count, Value::empty);
    }
    for temporary in self.temporaries.iter_mut() {
      temporary.reset(ValueType::Float, Storage::Uniform, 0);
    }
  }
}

fn require_kernel<K>(kernel: Option<K>, instruction: Instruction) -> K {
  match kernel {
    Some(kernel) => kernel,
    None => unreachable!("Error: There is no kernel for `{}`.", instruction),
  }
}

fn require_shapes(instruction: Instruction) -> (Shape, Shape) {
  match instruction.key.shapes() {
    Some(shapes) => shapes,
    None => unreachable!("Error: `{}` requires a key with two shapes.", instruction),
  }
}

fn require_shape(instruction: Instruction) -> Shape {
  match instruction.key.shape() {
    Some(shape) => shape,
    None => unreachable!("Error: `{}` requires a key with one shape.", instruction),
  }
}

/// Panics unless `value` has exactly the shape the instruction's key claims for it.
fn check_shape(value: &Value, expected: Shape, points: usize, instruction: Instruction) {
  assert!(
    Shape::of(value) == Some(expected) && value.size() == expected.storage.size(points),
    "Error: `{}` was given a {} {} of {} elements where its key requires {}.",
    instruction, value.storage(), value.ty(), value.size(), expected
  );
}

fn is_bindable(symbol: &Symbol) -> bool {
  symbol.kind != SymbolKind::Variable
}

/// Checks that a grid value can stand in for a symbol. A uniform value may bind a varying
/// symbol, since it can be broadcast; the reverse loses information.
fn check_binding(symbol: &Symbol, value: &Value) -> Result<(), MachineError> {
  if value.ty() != symbol.ty {
    return Err(MachineError::TypeMismatch {
      name     : symbol.name.to_string(),
      expected : symbol.ty,
      actual   : value.ty(),
    });
  }
  if value.is_varying() && !symbol.storage.is_varying() {
    return Err(MachineError::StorageMismatch {
      name     : symbol.name.to_string(),
      expected : symbol.storage,
      actual   : value.storage(),
    });
  }
  Ok(())
}

pub struct VirtualMachine<'r> {
  renderer  : &'r dyn Renderer,
  config    : MachineConfig,

  // Registers //
  ip        : usize,      // Instruction pointer, an index into the shader's code
  width     : usize,      // Dimensions of the grid being shaded
  height    : usize,
  masks     : MaskStack,
  registers : Registers,
  bound     : Vec<bool>,  // Which symbols were read from the grid

  // Statistics //
  executed  : u64,
}

impl<'r> VirtualMachine<'r> {

  pub fn new(renderer: &'r dyn Renderer) -> VirtualMachine<'r> {
    VirtualMachine::with_config(renderer, MachineConfig::default())
  }

  pub fn with_config(renderer: &'r dyn Renderer, config: MachineConfig) -> VirtualMachine<'r> {
    let mut registers = Registers::default();
    registers.temporaries.resize_with(config.temporaries_hint, Value::empty);
    VirtualMachine {
      renderer,
      config,
      ip       : 0,
      width    : 0,
      height   : 0,
      masks    : MaskStack::new(0),
      registers,
      bound    : Vec::new(),
      executed : 0,
    }
  }

  pub fn config(&self) -> &MachineConfig {
    &self.config
  }

  fn points(&self) -> usize {
    self.width * self.height
  }

  /// The number of instructions the most recent run executed.
  pub fn instructions_executed(&self) -> u64 {
    self.executed
  }

  /// Returns the instruction pointer, mask stack, and temporaries to their initial state,
  /// keeping allocations for the next run.
  pub fn reset(&mut self) {
    self.ip = 0;
    self.executed = 0;
    self.masks.reset(self.points());
    let count = self.registers.temporaries.len();
    self.registers.clear_temporaries(count);
  }

  // region Binding

  /**
    Prepares `grid` for `shader`: binds every global and parameter the grid lacks, globals
    zero filled and parameters from their defaults, and checks the ones it has against their
    declarations.
  */
  pub fn initialize(&self, grid: &mut Grid, shader: &Shader) -> Result<(), MachineError> {
    debug!(shader = %shader.name, points = grid.point_count(), "initialize");
    for symbol in shader.symbols.iter().filter(|symbol| is_bindable(symbol)) {
      match grid.value(&symbol.name) {
        Some(value) => check_binding(symbol, value)?,
        None => {
          grid.insert_value(&symbol.name, symbol.initial_value(grid.point_count()))?;
        }
      }
    }
    Ok(())
  }

  /// Validates every grid value `shader` will read before anything is loaded.
  fn prepare(&mut self, grid: &Grid, shader: &Shader) -> Result<(), MachineError> {
    for symbol in shader.symbols.iter().filter(|symbol| is_bindable(symbol)) {
      if let Some(value) = grid.value(&symbol.name) {
        check_binding(symbol, value)?;
      }
    }
    self.width  = grid.width();
    self.height = grid.height();
    self.registers.symbols.clear();
    self.bound.clear();
    Ok(())
  }

  fn bind(&mut self, symbol: &Symbol, value: Option<Value>) {
    let points = self.points();
    self.bound.push(value.is_some());
    let value = match value {
      Some(value) if symbol.storage.is_varying() && value.is_uniform() => value.broadcast(points),
      Some(value) => value,
      None        => symbol.initial_value(points),
    };
    self.registers.symbols.push(value);
  }

  /// Writes globals, and any other symbol read from the grid, into `grid`.
  fn store(&mut self, grid: &mut Grid, shader: &Shader) -> Result<(), MachineError> {
    for (slot, symbol) in shader.symbols.iter().enumerate() {
      if symbol.kind == SymbolKind::Global || self.bound[slot] {
        let value = mem::take(&mut self.registers.symbols[slot]);
        grid.insert_value(&symbol.name, value)?;
      }
    }
    Ok(())
  }

  /**
    Runs `shader` over `input`, writing its globals to `output`. Symbols missing from `input`
    start from their defaults, or zero. `output` must have the dimensions of `input`.
  */
  pub fn shade(&mut self, input: &Grid, output: &mut Grid, shader: &Shader)
    -> Result<(), MachineError>
  {
    debug!(shader = %shader.name, points = input.point_count(), "shade");
    let expected = (input.width(), input.height());
    let actual = (output.width(), output.height());
    if expected != actual {
      return Err(MachineError::GridMismatch { expected, actual });
    }
    self.prepare(input, shader)?;
    for symbol in shader.symbols.iter() {
      let value = match is_bindable(symbol) {
        true  => input.value(&symbol.name).cloned(),
        false => None,
      };
      self.bind(symbol, value);
    }

    self.execute(shader)?;
    self.store(output, shader)?;
    debug!(shader = %shader.name, instructions = self.executed, "shaded");
    Ok(())
  }

  /// Runs `shader` over `grid`, reading and writing it without copying its values.
  pub fn shade_in_place(&mut self, grid: &mut Grid, shader: &Shader) -> Result<(), MachineError> {
    debug!(shader = %shader.name, points = grid.point_count(), "shade in place");
    self.prepare(grid, shader)?;
    for symbol in shader.symbols.iter() {
      let value = match is_bindable(symbol) {
        true  => grid.take_value(&symbol.name),
        false => None,
      };
      self.bind(symbol, value);
    }

    // The grid's values are held by the machine until they are stored, whatever the outcome.
    let outcome = self.execute(shader);
    self.store(grid, shader)?;
    debug!(shader = %shader.name, instructions = self.executed, "shaded");
    outcome
  }

  // endregion

  // region Execution

  /**
    Executes `shader` from its first instruction until `halt` or the end of its code. The
    shader's symbols must already be loaded, which `shade` and `shade_in_place` do.
  */
  pub fn execute(&mut self, shader: &Shader) -> Result<(), MachineError> {
    assert_eq!(
      self.registers.symbols.len(), shader.symbols.len(),
      "Error: The symbols of `{}` have not been loaded.", shader.name
    );
    self.reset();
    self.registers.clear_temporaries(shader.temporaries);

    while self.ip < shader.code.len() {
      if let Some(limit) = self.config.instruction_limit {
        if self.executed >= limit {
          warn!(shader = %shader.name, limit, "instruction limit reached");
          return Err(MachineError::InstructionLimit { limit });
        }
      }

      let instruction = match try_decode_instruction(shader.code[self.ip]) {
        Ok(instruction) => instruction,
        Err(error) => unreachable!("Error: Malformed code at offset {}: {}", self.ip, error),
      };
      trace!(ip = self.ip, %instruction, "execute");
      self.executed += 1;

      match self.step(shader, instruction) {
        Flow::Next         => self.ip += instruction_size(&shader.code, self.ip, instruction.opcode),
        Flow::Jump(target) => self.ip = target,
        Flow::Halt         => break,
      }

      #[cfg(feature = "trace_computation")]
      trace!("\n{}", self);
    }
    Ok(())
  }

  /// The `n`th operand word of the current instruction.
  fn word(&self, shader: &Shader, n: usize) -> u32 {
    shader.code[self.ip + n]
  }

  /// The `n`th operand of the current instruction as an address.
  fn address(&self, shader: &Shader, n: usize) -> Address {
    let word = self.word(shader, n);
    match Address::decode(word) {
      Some(address) => address,
      None => unreachable!("Error: Malformed operand {:#010x} at offset {}.", word, self.ip + n),
    }
  }

  /// The value an operation computes into. A symbol result is computed into a scratch value
  /// that `commit` writes back under the mask.
  fn destination(&mut self, result: Address) -> Value {
    match result {
      Address::Symbol(_) => Value::empty(),
      _                  => self.registers.take(result),
    }
  }

  /**
    Stores a computed value at `result`. Temporaries, and symbols holding no value yet, take
    the value as it is. A symbol holding a varying value keeps its type and is written only at
    the points the mask marks active, a uniform result being broadcast first.
  */
  fn commit(&mut self, result: Address, value: Value) {
    let mut target = match result {
      Address::Symbol(_) => self.registers.take(result),
      _ => {
        self.registers.put(result, value);
        return;
      }
    };
    if target.is_empty() || target.is_uniform() {
      assert!(
        target.is_empty() || value.is_uniform(),
        "Error: A varying result was written to the uniform symbol {}.", result
      );
      self.registers.put(result, value);
      return;
    }

    assert_eq!(
      target.components(), value.components(),
      "Error: A {} result was written to the {} symbol {}.", value.ty(), target.ty(), result
    );
    let value = match value.is_uniform() {
      true  => value.broadcast(self.points()),
      false => value,
    };
    let width = target.components();
    match self.masks.active() {
      None       => target.floats_mut().copy_from_slice(value.floats()),
      Some(mask) => {
        let (floats, source) = (target.floats_mut(), value.floats());
        for (i, _) in mask.iter().enumerate().filter(|(_, active)| **active) {
          let range = i * width..(i + 1) * width;
          floats[range.clone()].copy_from_slice(&source[range]);
        }
      }
    }
    self.registers.put(result, target);
  }

  /// A copy of `operand` if it is about to be overwritten as `result`.
  fn snapshot(&self, shader: &Shader, operand: Address, result: Address) -> Option<Value> {
    match operand == result {
      true  => Some(self.registers.read(&shader.constants, operand).clone()),
      false => None,
    }
  }

  fn step(&mut self, shader: &Shader, instruction: Instruction) -> Flow {
    match instruction.opcode {

      Opcode::Null => {}

      Opcode::Halt => {
        return Flow::Halt;
      }

      Opcode::Reset => {
        let count = self.registers.temporaries.len();
        self.registers.clear_temporaries(count);
      }

      Opcode::ClearMask => {
        self.masks.clear();
      }

      Opcode::GenerateMask => {
        let address = self.address(shader, 1);
        let predicate = self.registers.read(&shader.constants, address);
        self.masks.generate(predicate);
      }

      Opcode::InvertMask => {
        self.masks.invert();
      }

      Opcode::JumpEmpty => {
        if self.masks.is_empty() {
          return Flow::Jump(self.word(shader, 1) as usize);
        }
      }

      Opcode::JumpNotEmpty => {
        if !self.masks.is_empty() {
          return Flow::Jump(self.word(shader, 1) as usize);
        }
      }

      Opcode::Jump => {
        return Flow::Jump(self.word(shader, 1) as usize);
      }

      Opcode::Transform => self.transform(shader, instruction),

      | Opcode::Multiply
      | Opcode::Divide
      | Opcode::Add
      | Opcode::Subtract
      | Opcode::Greater
      | Opcode::GreaterEqual
      | Opcode::Less
      | Opcode::LessEqual
      | Opcode::And
      | Opcode::Or
      | Opcode::Equal
      | Opcode::NotEqual => self.binary(shader, instruction),

      Opcode::Negate => self.negate(shader, instruction),

      | Opcode::Assign
      | Opcode::AddAssign
      | Opcode::SubtractAssign
      | Opcode::MultiplyAssign
      | Opcode::DivideAssign => self.assign(shader, instruction),

      Opcode::Call => self.call(shader),

      Opcode::Evaluate => self.evaluate(shader),

      Opcode::Promote => self.promote(shader, instruction),

      Opcode::Convert => self.convert(shader, instruction),

    }
    Flow::Next
  }

  // endregion

  // region Operations

  fn binary(&mut self, shader: &Shader, instruction: Instruction) {
    let opcode = instruction.opcode;
    let kernel = match opcode {
      | Opcode::Add
      | Opcode::Subtract
      | Opcode::Multiply
      | Opcode::Divide => kernels::binary(opcode, instruction.key),
      | Opcode::And
      | Opcode::Or     => kernels::logical(opcode, instruction.key),
      _                => kernels::compare(opcode, instruction.key),
    };
    let kernel = require_kernel(kernel, instruction);
    let (lhs_shape, rhs_shape) = require_shapes(instruction);
    let arithmetic = matches!(
      opcode,
      Opcode::Add | Opcode::Subtract | Opcode::Multiply | Opcode::Divide
    );

    let points = self.points();
    let result = self.address(shader, 1);
    let (lhs, rhs) = (self.address(shader, 2), self.address(shader, 3));
    let lhs_copy = self.snapshot(shader, lhs, result);
    let rhs_copy = self.snapshot(shader, rhs, result);
    let mut destination = self.destination(result);
    {
      let registers = &self.registers;
      let lhs = lhs_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, lhs));
      let rhs = rhs_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, rhs));
      check_shape(lhs, lhs_shape, points, instruction);
      check_shape(rhs, rhs_shape, points, instruction);

      // A result wider than a float takes the type of its wider operand.
      let ty = match (arithmetic, lhs.components().max(rhs.components())) {
        (false, _) | (true, 1)                    => ValueType::Float,
        _ if lhs.components() >= rhs.components() => lhs.ty(),
        _                                         => rhs.ty(),
      };
      let storage = lhs.storage().widest(rhs.storage());
      destination.ensure(ty, storage, storage.size(points));
      kernel(destination.floats_mut(), lhs.floats(), rhs.floats(), points);
    }
    self.commit(result, destination);
  }

  fn negate(&mut self, shader: &Shader, instruction: Instruction) {
    let kernel = require_kernel(kernels::negate(instruction.key), instruction);
    let shape = require_shape(instruction);

    let points = self.points();
    let (result, operand) = (self.address(shader, 1), self.address(shader, 2));
    let operand_copy = self.snapshot(shader, operand, result);
    let mut destination = self.destination(result);
    {
      let registers = &self.registers;
      let operand = operand_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, operand));
      check_shape(operand, shape, points, instruction);
      destination.ensure(operand.ty(), operand.storage(), operand.size());
      kernel(destination.floats_mut(), operand.floats(), points);
    }
    self.commit(result, destination);
  }

  /// `transform result, matrix, point`: a uniform matrix applied to points.
  fn transform(&mut self, shader: &Shader, instruction: Instruction) {
    let kernel = require_kernel(kernels::transform(instruction.key), instruction);
    let shape = require_shape(instruction);

    let points = self.points();
    let result = self.address(shader, 1);
    let (matrix, point) = (self.address(shader, 2), self.address(shader, 3));
    let matrix_copy = self.snapshot(shader, matrix, result);
    let point_copy = self.snapshot(shader, point, result);
    let mut destination = self.destination(result);
    {
      let registers = &self.registers;
      let matrix = matrix_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, matrix));
      let point = point_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, point));
      assert!(
        matrix.ty() == ValueType::Matrix && matrix.is_uniform(),
        "Error: `{}` requires a uniform matrix but was given a {} {}.",
        instruction, matrix.storage(), matrix.ty()
      );
      check_shape(point, shape, points, instruction);
      destination.ensure(point.ty(), point.storage(), point.size());
      kernel(destination.floats_mut(), matrix.floats(), point.floats(), points);
    }
    self.commit(result, destination);
  }

  fn assign(&mut self, shader: &Shader, instruction: Instruction) {
    let opcode = instruction.opcode;
    let kernel = require_kernel(kernels::assign(opcode, instruction.key), instruction);
    let (destination_shape, source_shape) = require_shapes(instruction);

    let points = self.points();
    let (target, source) = (self.address(shader, 1), self.address(shader, 2));
    let source_copy = self.snapshot(shader, source, target);
    let mut destination = self.registers.take(target);
    {
      let registers = &self.registers;
      let source = source_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, source));
      check_shape(source, source_shape, points, instruction);

      // A plain assignment gives an empty or differently shaped temporary the source's shape.
      let reshape = match target {
        Address::Temporary(_) => Shape::of(&destination) != Some(destination_shape),
        _                     => false,
      };
      if opcode == Opcode::Assign && (destination.is_empty() || reshape) {
        let storage = destination_shape.storage;
        destination.reset(source.ty(), storage, storage.size(points));
      }
      check_shape(&destination, destination_shape, points, instruction);

      let mask = match destination_shape.storage {
        Storage::Varying => self.masks.active(),
        Storage::Uniform => None,
      };
      kernel(destination.floats_mut(), source.floats(), mask, points);
    }
    self.registers.put(target, destination);
  }

  fn promote(&mut self, shader: &Shader, instruction: Instruction) {
    let kernel = require_kernel(kernels::promote(instruction.key), instruction);
    let (_, source_shape) = require_shapes(instruction);

    let points = self.points();
    let (result, source) = (self.address(shader, 1), self.address(shader, 2));
    let source_copy = self.snapshot(shader, source, result);
    let mut destination = self.destination(result);
    {
      let registers = &self.registers;
      let source = source_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, source));
      check_shape(source, source_shape, points, instruction);
      destination.ensure(source.ty(), Storage::Varying, points);
      kernel(destination.floats_mut(), source.floats(), points);
    }
    self.commit(result, destination);
  }

  /// `convert result, operand, type`: the operand retyped, or a float broadcast to a triple.
  fn convert(&mut self, shader: &Shader, instruction: Instruction) {
    let kernel = require_kernel(kernels::convert(instruction.key), instruction);
    let (result_shape, source_shape) = require_shapes(instruction);

    let points = self.points();
    let (result, source) = (self.address(shader, 1), self.address(shader, 2));
    let code = self.word(shader, 3);
    let ty = match ValueType::try_from(code as u8) {
      Ok(ty) if code <= u8::MAX as u32 => ty,
      _ => unreachable!("Error: `{}` was given the unknown type code {}.", instruction, code),
    };
    assert_eq!(
      ty.components(), result_shape.width.count(),
      "Error: `{}` cannot produce a {}.", instruction, ty
    );

    let source_copy = self.snapshot(shader, source, result);
    let mut destination = self.destination(result);
    {
      let registers = &self.registers;
      let source = source_copy.as_ref().unwrap_or_else(|| registers.read(&shader.constants, source));
      check_shape(source, source_shape, points, instruction);
      destination.ensure(ty, source.storage(), source.size());
      kernel(destination.floats_mut(), source.floats(), points);
    }
    self.commit(result, destination);
  }

  /**
    `call function, result, count, argument...`. Arguments are moved out of their registers for
    the duration of the call and moved back afterwards, so builtins that write their arguments
    (`setxcomp`, `fresnel`) write the registers. Constants, repeated arguments, and arguments
    that alias the result are passed as copies.
  */
  fn call(&mut self, shader: &Shader) {
    let id = self.word(shader, 1);
    let function = match Function::try_from(id as u8) {
      Ok(function) if id <= u8::MAX as u32 => function,
      _ => unreachable!("Error: Call to unknown function {}.", id),
    };
    let result = self.address(shader, 2);
    let count = self.word(shader, 3) as usize;
    let (least, most) = function.arity();
    assert!(
      least <= count && count <= most,
      "Error: {} takes {} to {} arguments but was given {}.", function, least, most, count
    );

    let addresses: Vec<Address> = (0..count).map(|n| self.address(shader, 4 + n)).collect();
    let mut moved = Vec::with_capacity(count);
    let mut arguments = Vec::with_capacity(count);
    for (n, address) in addresses.iter().enumerate() {
      let copied = address.is_constant()
        || addresses[..n].contains(address)
        || (!function.is_void() && *address == result);
      match copied {
        true  => arguments.push(self.registers.read(&shader.constants, *address).clone()),
        false => {
          arguments.push(self.registers.take(*address));
          moved.push(n);
        }
      }
    }

    let mut value = match function.is_void() {
      true  => Value::empty(),
      false => self.destination(result),
    };
    {
      let context = CallContext {
        renderer : self.renderer,
        width    : self.width,
        height   : self.height,
        points   : self.points(),
        mask     : self.masks.active(),
      };
      (function.kernel())(&context, &mut value, &mut arguments);
    }

    if !function.is_void() {
      self.commit(result, value);
    }
    // Restore in reverse so that each argument leaves the vector from its end.
    for n in moved.into_iter().rev() {
      arguments.truncate(n + 1);
      if let Some(argument) = arguments.pop() {
        self.registers.put(addresses[n], argument);
      }
    }
  }

  /// `evaluate shader`: hands the running shader's symbols to the renderer.
  fn evaluate(&mut self, shader: &Shader) {
    let address = self.address(shader, 1);
    let name = DefaultAtom::from(self.registers.read(&shader.constants, address).string());
    let mut bindings = Bindings::new(&shader.symbols, &mut self.registers.symbols);
    self.renderer.evaluate(&name, &mut bindings);
  }

  // endregion

  // region Display methods

  fn make_register_table(title: &str, names: &[String], values: &[Value]) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->title, ubl->"Contents"]);
    for (name, value) in names.iter().zip(values.iter()) {
      table.add_row(row![r->name, format!("{}", value)]);
    }
    table
  }

  // endregion
}

impl<'r> Display for VirtualMachine<'r> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let symbols: Vec<String> =
      (0..self.registers.symbols.len()).map(|i| format!("{}", Address::Symbol(i as u32))).collect();
    let temporaries: Vec<String> =
      (0..self.registers.temporaries.len()).map(|i| format!("{}", Address::Temporary(i as u32))).collect();

    let symbol_table = VirtualMachine::make_register_table("Symbol", &symbols, &self.registers.symbols);
    let temporary_table =
      VirtualMachine::make_register_table("Temporary", &temporaries, &self.registers.temporaries);

    let mut table = table!([symbol_table, temporary_table]);
    table.set_format(*TABLE_DISPLAY_FORMAT);
    write!(
      f,
      "ip = {}, mask depth = {}, active points = {}\n{}",
      self.ip, self.masks.depth(), self.masks.active_points(), table
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{encode_instruction, DispatchKey, Word};
  use crate::renderer::NullRenderer;
  use crate::shader::ShaderKind;

  fn instruction(opcode: Opcode, key: &str) -> Word {
    encode_instruction(Instruction::new(opcode, key.parse::<DispatchKey>().unwrap()))
  }

  fn shader_with(symbols: &[(&str, SymbolKind, ValueType, Storage)]) -> Shader {
    let mut shader = Shader::new(ShaderKind::Surface, "test");
    for (name, kind, ty, storage) in symbols {
      shader.symbols.insert(Symbol::new(name, *kind, *ty, *storage)).unwrap();
    }
    shader
  }

  #[test]
  fn uniform_arithmetic_touches_one_element() {
    let mut shader = shader_with(&[("y", SymbolKind::Global, ValueType::Float, Storage::Uniform)]);
    shader.constants = vec![Value::uniform_float(2.0), Value::uniform_float(3.0)];
    shader.temporaries = 1;
    shader.code = vec![
      instruction(Opcode::Multiply, "u1u1"),
      Address::Temporary(0).encode(), Address::Constant(0).encode(), Address::Constant(1).encode(),
      instruction(Opcode::Assign, "u1u1"),
      Address::Symbol(0).encode(), Address::Temporary(0).encode(),
    ];

    let mut grid = Grid::new(4, 4);
    let mut machine = VirtualMachine::new(&NullRenderer);
    machine.initialize(&mut grid, &shader).unwrap();
    machine.shade_in_place(&mut grid, &shader).unwrap();
    assert_eq!(grid.floats("y").unwrap(), &[6.0]);
    assert_eq!(machine.instructions_executed(), 2);
  }

  #[test]
  fn operands_aliasing_the_result_are_read_first() {
    let mut shader = shader_with(&[("x", SymbolKind::Global, ValueType::Float, Storage::Varying)]);
    shader.code = vec![
      instruction(Opcode::Add, "v1v1"),
      Address::Symbol(0).encode(), Address::Symbol(0).encode(), Address::Symbol(0).encode(),
    ];
    let mut grid = Grid::with_points(3);
    grid.insert_value("x", Value::varying_float(&[1.0, 2.0, 3.0])).unwrap();
    VirtualMachine::new(&NullRenderer).shade_in_place(&mut grid, &shader).unwrap();
    assert_eq!(grid.floats("x").unwrap(), &[2.0, 4.0, 6.0]);
  }

  #[test]
  fn results_written_to_symbols_respect_the_mask() {
    let mut shader = shader_with(&[
      ("x", SymbolKind::Global, ValueType::Float, Storage::Varying),
      ("y", SymbolKind::Global, ValueType::Float, Storage::Varying),
    ]);
    shader.constants = vec![Value::uniform_float(0.0), Value::uniform_float(5.0)];
    shader.temporaries = 1;
    shader.code = vec![
      instruction(Opcode::Greater, "v1u1"),
      Address::Temporary(0).encode(), Address::Symbol(0).encode(), Address::Constant(0).encode(),
      encode_instruction(Instruction::nullary(Opcode::GenerateMask)), Address::Temporary(0).encode(),
      instruction(Opcode::Add, "v1u1"),
      Address::Symbol(1).encode(), Address::Symbol(0).encode(), Address::Constant(1).encode(),
      instruction(Opcode::Negate, "v1"),
      Address::Symbol(0).encode(), Address::Symbol(0).encode(),
      encode_instruction(Instruction::nullary(Opcode::ClearMask)),
    ];

    let mut grid = Grid::with_points(4);
    grid.insert_value("x", Value::varying_float(&[1.0, -1.0, 1.0, -1.0])).unwrap();
    let mut machine = VirtualMachine::new(&NullRenderer);
    machine.initialize(&mut grid, &shader).unwrap();
    machine.shade_in_place(&mut grid, &shader).unwrap();
    assert_eq!(grid.floats("y").unwrap(), &[6.0, 0.0, 6.0, 0.0]);
    assert_eq!(grid.floats("x").unwrap(), &[-1.0, -1.0, -1.0, -1.0]);
  }

  #[test]
  fn shade_rejects_an_output_of_another_size() {
    let mut shader = shader_with(&[("x", SymbolKind::Global, ValueType::Float, Storage::Varying)]);
    shader.code = vec![encode_instruction(Instruction::nullary(Opcode::Halt))];
    let mut input = Grid::with_points(4);
    input.insert_value("x", Value::varying_float(&[1.0, 2.0, 3.0, 4.0])).unwrap();
    let mut output = Grid::with_points(2);

    let mut machine = VirtualMachine::new(&NullRenderer);
    assert_eq!(
      machine.shade(&input, &mut output, &shader),
      Err(MachineError::GridMismatch { expected: (4, 1), actual: (2, 1) })
    );
    assert_eq!(machine.instructions_executed(), 0);
    assert!(output.names().is_empty());
  }

  #[test]
  fn instruction_limit_stops_a_loop() {
    let mut shader = shader_with(&[]);
    shader.code = vec![encode_instruction(Instruction::nullary(Opcode::Jump)), 0];
    let config = MachineConfig::default().with_instruction_limit(10);
    let mut machine = VirtualMachine::with_config(&NullRenderer, config);
    let mut grid = Grid::with_points(1);
    assert_eq!(
      machine.shade_in_place(&mut grid, &shader),
      Err(MachineError::InstructionLimit { limit: 10 })
    );
    assert_eq!(machine.instructions_executed(), 10);
  }

  #[test]
  fn initialize_checks_declared_types() {
    let shader = shader_with(&[
      ("Cs", SymbolKind::Global, ValueType::Color, Storage::Varying),
      ("Kd", SymbolKind::Parameter, ValueType::Float, Storage::Uniform),
    ]);
    let machine = VirtualMachine::new(&NullRenderer);

    let mut grid = Grid::new(2, 2);
    machine.initialize(&mut grid, &shader).unwrap();
    assert_eq!(grid.value("Cs").map(Value::size), Some(4));
    assert_eq!(grid.value("Kd").map(Value::is_uniform), Some(true));

    let mut grid = Grid::new(2, 2);
    grid.add_value("Cs", ValueType::Float);
    assert_eq!(
      machine.initialize(&mut grid, &shader),
      Err(MachineError::TypeMismatch {
        name: "Cs".to_string(), expected: ValueType::Color, actual: ValueType::Float
      })
    );

    let mut grid = Grid::new(2, 2);
    grid.add_value("Kd", ValueType::Float);
    assert!(matches!(
      machine.initialize(&mut grid, &shader),
      Err(MachineError::StorageMismatch { .. })
    ));
  }

  #[test]
  fn parameters_default_when_unbound() {
    let mut shader = shader_with(&[("y", SymbolKind::Global, ValueType::Float, Storage::Varying)]);
    shader.symbols.insert(
      Symbol::new("Ks", SymbolKind::Parameter, ValueType::Float, Storage::Uniform)
        .with_default(Value::uniform_float(0.25))
    ).unwrap();
    shader.code = vec![
      instruction(Opcode::Assign, "v1u1"),
      Address::Symbol(0).encode(), Address::Symbol(1).encode(),
    ];

    let input = Grid::with_points(2);
    let mut output = Grid::with_points(2);
    VirtualMachine::new(&NullRenderer).shade(&input, &mut output, &shader).unwrap();
    assert_eq!(output.floats("y").unwrap(), &[0.25, 0.25]);
    assert!(!output.contains("Ks"));
  }

  #[test]
  #[should_panic(expected = "no kernel")]
  fn unsupported_keys_panic() {
    let mut shader = shader_with(&[]);
    shader.constants = vec![Value::uniform_float(1.0)];
    shader.temporaries = 1;
    shader.code = vec![
      instruction(Opcode::Greater, "u3u3"),
      Address::Temporary(0).encode(), Address::Constant(0).encode(), Address::Constant(0).encode(),
    ];
    let mut grid = Grid::with_points(1);
    let _ = VirtualMachine::new(&NullRenderer).shade_in_place(&mut grid, &shader);
  }
}
