//! Shared table style for displaying grids and machine state.

use prettytable::format as TableFormat;

lazy_static! {
  pub static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/// Formats element `i` of `value` for a table cell.
pub fn cell_text(value: &crate::value::Value, i: usize) -> String {
  use crate::types::ValueType;

  match value.ty() {
    ValueType::String => value.string().to_string(),
    ValueType::Float  => format!("{}", value.float(i)),
    ValueType::Matrix => format!("{:?}", value.matrix(i).to_cols_array()),
    _ => {
      let v = value.vec3(i);
      format!("({}, {}, {})", v.x, v.y, v.z)
    }
  }
}
