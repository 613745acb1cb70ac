//! A compiled shader: its code, constants, and symbols.

use strum_macros::{Display as StrumDisplay, EnumString};

use crate::bytecode::Word;
use crate::symboltable::SymbolTable;
use crate::value::Value;

#[derive(StrumDisplay, EnumString, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum ShaderKind {
  Surface,
  Light,
  Volume,
  Displacement,
  Imager,
}

#[derive(Clone, Debug)]
pub struct Shader {
  pub kind        : ShaderKind,
  pub name        : String,
  pub code        : Vec<Word>,
  /// Uniform values addressed by `Address::Constant`.
  pub constants   : Vec<Value>,
  pub symbols     : SymbolTable,
  /// Number of temporaries the code addresses.
  pub temporaries : usize,
}

impl Shader {
  pub fn new(kind: ShaderKind, name: &str) -> Shader {
    Shader {
      kind,
      name        : name.to_string(),
      code        : Vec::new(),
      constants   : Vec::new(),
      symbols     : SymbolTable::new(),
      temporaries : 0,
    }
  }
}
