//! Result formatting for the terminal

use sqlsage_schema::ResultSet;
use unicode_width::UnicodeWidthStr;

/// Render a single value for display
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format a result set as an aligned ASCII table.
///
/// Column and row order are the store's; an empty result renders as a short
/// notice instead of a bare header.
pub fn format_results(results: &ResultSet) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let rendered: Vec<Vec<String>> = results
        .rows
        .iter()
        .map(|row| row.iter().map(display_value).collect())
        .collect();

    let widths: Vec<usize> = results
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            rendered
                .iter()
                .map(|row| row[idx].width())
                .chain(std::iter::once(col.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize| {
        let padding = width.saturating_sub(text.width());
        format!("{}{}", text, " ".repeat(padding))
    };

    let header = results
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| pad(col, widths[idx]))
        .collect::<Vec<_>>()
        .join(" | ");

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![header, separator];
    for row in &rendered {
        lines.push(
            row.iter()
                .enumerate()
                .map(|(idx, cell)| pad(cell, widths[idx]))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }

    lines.join("\n")
}
