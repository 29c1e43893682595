//! Output formatting helpers for human-readable and JSON output.

use arbor::{Key, Value};

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_line(headers.iter().map(|h| h.to_string()).collect()));
    for row in rows {
        println!("{}", format_line(row.iter().take(col_count).cloned().collect()));
    }
}

/// Short text for a value in a table cell.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Empty => "-".to_string(),
        Value::Null => "null".to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Node(node) => format!("<{} #{} len={}>", value.type_name(), node.uid(), node.len()),
        Value::Alias(view) => format!("<{} #{} len={}>", value.type_name(), view.uid(), view.len()),
        other => other.to_string_or(""),
    }
}

/// Key column text: names as-is, indices in brackets.
pub fn key_label(key: &Key) -> String {
    match key {
        Key::Index(idx) => format!("[{idx}]"),
        other => other.to_string(),
    }
}
