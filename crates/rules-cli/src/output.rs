//! Rendering operation results.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::new("null").fg(Color::DarkGrey),
        Value::String(s) => Cell::new(s),
        Value::Number(n) => Cell::new(n).set_alignment(CellAlignment::Right),
        other => Cell::new(other),
    }
}

/// Table of the first `limit` row values, with a trailing row count note.
pub fn results_table(operation_id: &str, values: &[Value], limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Row"), header_cell(operation_id)]);
    apply_table_style(&mut table);
    for (row, value) in values.iter().enumerate().take(limit) {
        table.add_row(vec![
            Cell::new(row).set_alignment(CellAlignment::Right),
            value_cell(value),
        ]);
    }
    if values.len() > limit {
        table.add_row(vec![
            Cell::new("...").fg(Color::DarkGrey),
            Cell::new(format!("{} more rows", values.len() - limit)).fg(Color::DarkGrey),
        ]);
    }
    table
}

/// One JSON object per row holding the row number and the value.
pub fn json_lines(operation_id: &str, values: &[Value]) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let mut line = serde_json::Map::new();
            line.insert("row".to_string(), Value::from(row));
            line.insert(operation_id.to_string(), value.clone());
            Value::Object(line).to_string()
        })
        .collect()
}
