use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(render_table(&serde_json::to_value(value)?)),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

/// Objects become key/value tables with nested fields flattened to dotted
/// keys; arrays of objects become one row per element.
fn render_table(value: &Value) -> String {
    match value {
        Value::Array(items) => render_rows(items),
        Value::Object(map) => {
            let mut flat = Vec::new();
            flatten("", map, &mut flat);
            let rows = flat
                .into_iter()
                .map(|(key, value)| vec![key, cell(&value)])
                .collect::<Vec<_>>();
            table::render_table(&["key", "value"], &rows, options())
        }
        scalar => cell(scalar),
    }
}

fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    let flattened = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => {
                let mut flat = Vec::new();
                flatten("", map, &mut flat);
                flat
            }
            other => vec![(String::from("value"), other.clone())],
        })
        .collect::<Vec<_>>();

    let mut headers = Vec::<String>::new();
    for row in &flattened {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = flattened
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| {
                    row.iter()
                        .find(|(key, _)| key == header)
                        .map_or_else(|| String::from("-"), |(_, value)| cell(value))
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    table::render_table(&header_refs, &rows, options())
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten(&key, inner, out),
            other => out.push((key, other.clone())),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(", "),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Counters {
        added: u32,
        skipped: u32,
    }

    #[derive(Serialize)]
    struct Summary {
        run_id: Option<i64>,
        counters: Counters,
        healed: Vec<i64>,
    }

    fn summary() -> Summary {
        Summary {
            run_id: Some(7),
            counters: Counters {
                added: 3,
                skipped: 1,
            },
            healed: vec![4, 5],
        }
    }

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&summary(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["counters"]["added"], 3);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&summary(), OutputFormat::Raw).unwrap();
        assert!(!out.contains('\n'));
    }

    #[test]
    fn table_render_flattens_nested_objects() {
        let out = render(&summary(), OutputFormat::Table).unwrap();
        assert!(out.lines().next().is_some_and(|line| line.starts_with("key")));
        assert!(out.contains("counters.added"));
        assert!(out.contains("counters.skipped"));
        assert!(out.contains("4, 5"));
    }

    #[test]
    fn table_render_for_rows_unions_columns() {
        let rows = vec![
            serde_json::json!({"id": 1, "status": "SUCCESS"}),
            serde_json::json!({"id": 2, "error": "boom"}),
        ];
        let out = render(&rows, OutputFormat::Table).unwrap();
        let header = out.lines().next().unwrap();
        assert!(header.contains("id") && header.contains("status") && header.contains("error"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn empty_rows_render_placeholder() {
        let rows: Vec<serde_json::Value> = Vec::new();
        assert_eq!(render(&rows, OutputFormat::Table).unwrap(), "(no rows)");
    }
}
