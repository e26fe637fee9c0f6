use bitsql::Row;
use serde_json::Value as JsonValue;
use std::fmt::Write as _;

/// Render rows as an aligned text table with a trailing row count.
pub fn table(names: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values().iter().map(cell).collect())
        .collect();

    let mut widths: Vec<usize> = names.iter().map(|name| name.chars().count()).collect();
    for row in &cells {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, names, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row, &widths);
    }

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    let _ = writeln!(out, "({} {noun})", rows.len());

    out
}

fn push_line(out: &mut String, values: &[String], widths: &[usize]) {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

fn cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::String(text) => text.replace('\n', "\\n"),
        other => other.to_string(),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn columns_align_to_the_widest_cell() {
        let names: Arc<[String]> = Arc::from(vec!["name".to_string(), "age".to_string()]);
        let rows = vec![
            Row::new(Arc::clone(&names), vec![json!("Annabel"), json!(31)]),
            Row::new(Arc::clone(&names), vec![JsonValue::Null, json!(4)]),
        ];

        let out = table(&names, &rows);

        assert_eq!(
            out,
            "name    | age\n--------+----\nAnnabel | 31\nNULL    | 4\n(2 rows)\n"
        );
    }

    #[test]
    fn empty_results_keep_the_header() {
        let out = table(&["record_id".to_string()], &[]);

        assert_eq!(out, "record_id\n---------\n(0 rows)\n");
    }
}
