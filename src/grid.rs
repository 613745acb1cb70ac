/*!
  A `Grid` is the set of shading points one execution of a shader covers, usually a
  rectangular lattice of micropolygon vertices, together with the named values bound to it.
  The pipeline populates a grid with geometric and shading inputs, the machine shades it, and
  the pipeline reads the outputs back by name.

  Every varying value bound to a grid has exactly `point_count()` elements and every uniform
  value has one; the insertion methods enforce this.
*/

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use prettytable::{Cell as TableCell, Row, Table};
use string_cache::DefaultAtom;

use crate::error::GridError;
use crate::table::{cell_text, TABLE_DISPLAY_FORMAT};
use crate::types::{Storage, ValueType};
use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub struct Grid {
  width  : usize,
  height : usize,
  values : HashMap<DefaultAtom, Value>,
}

impl Grid {

  pub fn new(width: usize, height: usize) -> Grid {
    Grid {
      width,
      height,
      values: HashMap::new(),
    }
  }

  /// A grid over a set of `points` points that are not arranged in rows and columns.
  pub fn with_points(points: usize) -> Grid {
    Grid::new(points, 1)
  }

  /// Changes the dimensions of the grid, dropping every bound value.
  pub fn resize(&mut self, width: usize, height: usize) {
    self.width  = width;
    self.height = height;
    self.values.clear();
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn point_count(&self) -> usize {
    self.width * self.height
  }

  /// Binds a zero filled varying value to `name`, replacing any value bound before.
  pub fn add_value(&mut self, name: &str, ty: ValueType) -> &mut Value {
    let value = Value::new(ty, Storage::Varying, self.point_count());
    self.bind(DefaultAtom::from(name), value)
  }

  /// Binds a zero filled uniform value to `name`, replacing any value bound before.
  pub fn add_uniform_value(&mut self, name: &str, ty: ValueType) -> &mut Value {
    let value = Value::new(ty, Storage::Uniform, 1);
    self.bind(DefaultAtom::from(name), value)
  }

  /// Binds an existing value to `name`, returning the value it replaces.
  pub fn insert_value(&mut self, name: &str, value: Value) -> Result<Option<Value>, GridError> {
    let expected = value.storage().size(self.point_count());
    if value.size() != expected {
      return Err(GridError::SizeMismatch {
        name   : name.to_string(),
        expected,
        actual : value.size(),
      });
    }
    Ok(self.values.insert(DefaultAtom::from(name), value))
  }

  fn bind(&mut self, name: DefaultAtom, value: Value) -> &mut Value {
    self.values.insert(name.clone(), value);
    match self.values.get_mut(&name) {
      Some(value) => value,
      None        => unreachable!("a value just bound to the grid is missing"),
    }
  }

  pub fn value(&self, name: &str) -> Option<&Value> {
    self.values.get(&DefaultAtom::from(name))
  }

  pub fn value_mut(&mut self, name: &str) -> Option<&mut Value> {
    self.values.get_mut(&DefaultAtom::from(name))
  }

  /// Unbinds and returns the value bound to `name`.
  pub fn take_value(&mut self, name: &str) -> Option<Value> {
    self.values.remove(&DefaultAtom::from(name))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(&DefaultAtom::from(name))
  }

  /// The names of the bound values in sorted order.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.values.keys().map(|name| &**name).collect();
    names.sort_unstable();
    names
  }

  /// Convenience for reading a float value's elements, used heavily by tests.
  pub fn floats(&self, name: &str) -> Option<&[f32]> {
    self.value(name).map(Value::floats)
  }

  /// Convenience for writing a float value's elements.
  pub fn floats_mut(&mut self, name: &str) -> Option<&mut [f32]> {
    self.value_mut(name).map(Value::floats_mut)
  }
}

impl Display for Grid {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let names = self.names();

    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);

    let mut titles = vec![TableCell::new("Point")];
    titles.extend(names.iter().map(|name| TableCell::new(name)));
    table.set_titles(Row::new(titles));

    for i in 0..self.point_count() {
      let mut cells = vec![TableCell::new(&format!("({}, {})", i % self.width.max(1), i / self.width.max(1)))];
      for name in &names {
        let text = match self.value(name) {
          Some(value) if !value.is_empty() => cell_text(value, i),
          _                                => String::new(),
        };
        cells.push(TableCell::new(&text));
      }
      table.add_row(Row::new(cells));
    }

    write!(f, "Grid {}x{}\n{}", self.width, self.height, table)
  }
}
