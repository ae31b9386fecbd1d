//! Result formatting for athena-query.
//!
//! Renders a [`QueryResult`] as an ASCII grid for the terminal, or writes it
//! to a CSV or JSON file.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AthenaQueryError, Result};
use crate::query::{Column, QueryResult, Row};

/// Default maximum display width of a table cell.
pub const DEFAULT_MAX_WIDTH: usize = 50;

const NULL_DISPLAY: &str = "NULL";

/// Formats a query result as an ASCII grid table.
///
/// Values longer than `max_width` characters are cut to `max_width - 3`
/// characters followed by `...`. NULL cells show as `NULL`. Columns whose
/// displayed values all parse as numbers are right-aligned, header included.
pub fn format_as_table(result: &QueryResult, max_width: usize) -> String {
    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|i| {
                    let value = row.get(i).and_then(|v| v.as_deref());
                    truncate_value(value.unwrap_or(NULL_DISPLAY), max_width)
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let right_align: Vec<bool> = (0..headers.len())
        .map(|i| !cells.is_empty() && cells.iter().all(|row| is_number(&row[i])))
        .collect();

    let mut output = String::new();
    output.push_str(&border(&widths, '-'));
    output.push_str(&grid_row(&headers, &widths, &right_align));
    output.push_str(&border(&widths, '='));

    for (i, row) in cells.iter().enumerate() {
        output.push_str(&grid_row(row, &widths, &right_align));
        if i + 1 < cells.len() {
            output.push_str(&border(&widths, '-'));
        }
    }
    if !cells.is_empty() {
        output.push_str(&border(&widths, '-'));
    }

    // Drop the newline after the final border.
    output.pop();

    if result.row_count == 0 {
        output.push_str("\n\n(0 rows returned)");
    }

    output
}

/// Truncates `value` to `max_width` characters, marking the cut with `...`.
fn truncate_value(value: &str, max_width: usize) -> String {
    if value.chars().count() <= max_width {
        value.to_string()
    } else if max_width <= 3 {
        value.chars().take(max_width).collect()
    } else {
        let take = max_width - 3;
        format!("{}...", value.chars().take(take).collect::<String>())
    }
}

fn border(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat(fill).take(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn grid_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let mut line = String::from("|");
    for ((value, width), right) in values.iter().zip(widths).zip(right_align) {
        let padding = " ".repeat(width - value.chars().count());
        if *right {
            line.push_str(&format!(" {padding}{value} |"));
        } else {
            line.push_str(&format!(" {value}{padding} |"));
        }
    }
    line.push('\n');
    line
}

fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Writes the result to a CSV file: a header row of column names, then one
/// record per row. NULL is written as an empty field.
pub fn write_to_csv(result: &QueryResult, path: &Path) -> Result<()> {
    let map_err = |e: csv::Error| {
        AthenaQueryError::file_output(format!(
            "Failed to write CSV file '{}': {e}",
            path.display()
        ))
    };

    let mut writer = csv::Writer::from_path(path).map_err(map_err)?;
    writer
        .write_record(result.columns.iter().map(|c| c.name.as_str()))
        .map_err(map_err)?;
    for row in &result.rows {
        writer
            .write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))
            .map_err(map_err)?;
    }
    writer.flush().map_err(|e| map_err(e.into()))?;
    Ok(())
}

/// JSON document shape: `{columns, rows, row_count}` with each row an object
/// keyed by column name in column order.
#[derive(Serialize)]
struct JsonDocument<'a> {
    columns: &'a [Column],
    rows: Vec<JsonRow<'a>>,
    row_count: usize,
}

struct JsonRow<'a> {
    columns: &'a [Column],
    values: &'a Row,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (i, column) in self.columns.iter().enumerate() {
            let value = self.values.get(i).and_then(|v| v.as_deref());
            map.serialize_entry(&column.name, &value)?;
        }
        map.end()
    }
}

/// Writes the result to a pretty-printed JSON file.
pub fn write_to_json(result: &QueryResult, path: &Path) -> Result<()> {
    let map_err = |e: std::io::Error| {
        AthenaQueryError::file_output(format!(
            "Failed to write JSON file '{}': {e}",
            path.display()
        ))
    };

    let document = JsonDocument {
        columns: &result.columns,
        rows: result
            .rows
            .iter()
            .map(|values| JsonRow {
                columns: &result.columns,
                values,
            })
            .collect(),
        row_count: result.row_count,
    };

    let file = File::create(path).map_err(map_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)
        .map_err(|e| map_err(std::io::Error::from(e)))?;
    writer.flush().map_err(map_err)?;
    Ok(())
}
