use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::types::{Storage, ValueType};
use crate::value::Value;

/// Where a symbol's value comes from and whether it is written back to the grid.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SymbolKind {
  /// Supplied by the renderer through the grid (`P`, `N`, `Ci`, ...) and written back.
  Global,
  /// A shader parameter. Read from the grid when bound there, otherwise from its default.
  Parameter,
  /// A local variable, private to one execution.
  Variable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
  pub name    : DefaultAtom,
  pub kind    : SymbolKind,
  pub ty      : ValueType,
  pub storage : Storage,
  /// Initial value of a parameter or variable. Must be uniform or cover the grid.
  pub default : Option<Value>,
}

impl Symbol {
  pub fn new(name: &str, kind: SymbolKind, ty: ValueType, storage: Storage) -> Symbol {
    Symbol {
      name: DefaultAtom::from(name),
      kind,
      ty,
      storage,
      default: None,
    }
  }

  pub fn with_default(mut self, default: Value) -> Symbol {
    self.default = Some(default);
    self
  }

  /// A value of this symbol's declared type and storage for a grid of `points` points,
  /// initialized from the default if there is one.
  pub fn initial_value(&self, points: usize) -> Value {
    let size = self.storage.size(points);
    match &self.default {
      Some(default) if self.storage.is_varying() => default.broadcast(size),
      Some(default)                              => default.clone(),
      None                                       => Value::new(self.ty, self.storage, size),
    }
  }
}

/**
  The symbols of a compiled shader, numbered in declaration order. `Address::Symbol(i)` refers
  to slot `i`. The table is a convenience wrapper around a `BiMap` from name to slot plus the
  symbol records themselves.
*/
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
  table   : BiMap<DefaultAtom, usize>,
  symbols : Vec<Symbol>,
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable {
      table   : BiMap::new(),
      symbols : Vec::new(),
    }
  }

  /// Adds a symbol, returning its slot, or gives the symbol back if the name is taken.
  pub fn insert(&mut self, symbol: Symbol) -> Result<usize, Symbol> {
    let slot = self.symbols.len();
    match self.table.insert_no_overwrite(symbol.name.clone(), slot) {
      Ok(())  => {
        self.symbols.push(symbol);
        Ok(slot)
      }
      Err(_) => Err(symbol),
    }
  }

  pub fn get_slot(&self, name: &str) -> Option<usize> {
    self.table.get_by_left(&DefaultAtom::from(name)).cloned()
  }

  pub fn get_name(&self, slot: usize) -> Option<&str> {
    self.table.get_by_right(&slot).map(|name| &**name)
  }

  pub fn symbol(&self, slot: usize) -> &Symbol {
    &self.symbols[slot]
  }

  pub fn lookup(&self, name: &str) -> Option<&Symbol> {
    self.get_slot(name).map(|slot| &self.symbols[slot])
  }

  pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
    self.symbols.iter()
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }
}
