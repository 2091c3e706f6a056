//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of items in the chosen format.
///
/// - `table`: builds rows with `to_row` and draws them with `tabled`
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `id_fn` on each item, one per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single item. Table output uses `detail_fn` for a pre-formatted view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Serialize `data` as JSON or YAML. Table and plain fall back to pretty JSON.
pub fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            serde_json::to_string_pretty(data)?
        }
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Whether stderr status lines should be colored.
pub fn should_color() -> bool {
    io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Print a status line to stderr unless quiet.
pub fn status_line(message: &str, quiet: bool) {
    if quiet {
        return;
    }
    if should_color() {
        eprintln!("{} {message}", "●".cyan());
    } else {
        eprintln!("{message}");
    }
}

// ── Key/value views ──────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Two-column table of a JSON object. Nested objects are flattened with
/// dotted keys; arrays are summarized by length.
pub fn render_fields(fields: &Map<String, Value>) -> String {
    let mut rows = Vec::new();
    flatten_into(&mut rows, "", fields);
    render_table(&rows)
}

fn flatten_into(rows: &mut Vec<FieldRow>, prefix: &str, fields: &Map<String, Value>) {
    let mut keys: Vec<_> = fields.keys().collect();
    keys.sort();
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match &fields[key] {
            Value::Object(inner) => flatten_into(rows, &path, inner),
            Value::Array(items) => rows.push(FieldRow {
                key: path,
                value: format!("[{} items]", items.len()),
            }),
            Value::String(s) => rows.push(FieldRow {
                key: path,
                value: s.clone(),
            }),
            Value::Null => rows.push(FieldRow {
                key: path,
                value: String::new(),
            }),
            other => rows.push(FieldRow {
                key: path,
                value: other.to_string(),
            }),
        }
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: u32,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "Front" }, Item { id: 2, name: "Back" }]
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(
            OutputFormat::Plain,
            &items(),
            |i| ItemRow { id: i.id },
            |i| i.name.to_owned(),
        )
        .unwrap();
        assert_eq!(out, "Front\nBack");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            OutputFormat::JsonCompact,
            &items(),
            |i| ItemRow { id: i.id },
            |i| i.name.to_owned(),
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":1,"name":"Front"},{"id":2,"name":"Back"}]"#);
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(
            OutputFormat::Table,
            &items(),
            |i| ItemRow { id: i.id },
            |i| i.name.to_owned(),
        )
        .unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains('2'));
    }

    #[test]
    fn fields_flatten_nested_objects() {
        let value = json!({
            "system": { "rainSensorRainStart": null, "name": "Garden" },
            "wifi": [1, 2, 3],
            "zones": 12
        });
        let Value::Object(map) = value else {
            unreachable!()
        };
        let out = render_fields(&map);
        assert!(out.contains("system.name"));
        assert!(out.contains("Garden"));
        assert!(out.contains("[3 items]"));
        assert!(out.contains("12"));
    }
}
