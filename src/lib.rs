/*!
  A virtual machine for compiled REYES shaders.

  A renderer dices geometry into grids of shading points and runs a shader over each grid.
  The machine executes the shader's bytecode one instruction at a time for the whole grid:
  every instruction selects a kernel specialized for the storage and width of its operands
  (its dispatch key) and applies it to all points. Conditionals run both branches under a
  stack of boolean masks.

  ```text
  let shader  = bytecode::assemble(text)?;
  let mut vm  = VirtualMachine::new(&renderer);
  vm.initialize(&mut grid, &shader)?;
  vm.shade_in_place(&mut grid, &shader)?;
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod config;
pub mod error;
pub mod grid;
pub mod kernels;
pub mod machine;
pub mod mask;
pub mod renderer;
pub mod shader;
pub mod symboltable;
pub mod types;
pub mod value;
mod table;

pub use crate::bytecode::{assemble, disassemble};
pub use crate::config::MachineConfig;
pub use crate::error::{AssemblyError, DecodeError, GridError, MachineError};
pub use crate::grid::Grid;
pub use crate::machine::VirtualMachine;
pub use crate::renderer::{Bindings, NullRenderer, Renderer, SpaceTable};
pub use crate::shader::{Shader, ShaderKind};
pub use crate::types::{Storage, ValueType};
pub use crate::value::Value;
