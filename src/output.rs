//! JSON text rendering for wire values.
//!
//! This module renders a wire [`Value`] tree to JSON text, in both compact
//! and pretty-printed forms. It exists for diagnostics and tests: the real
//! binary wire encoding is owned by the (external) codec layer. Rendering is
//! deterministic — document keys keep their insertion order, which is the
//! order the server expects operator documents in.
//!
//! The non-JSON scalars use extended forms:
//!
//! - `DateTime` renders as `{"$date": <millis>}`
//! - `Regex` renders as `{"$regex": "...", "$options": "..."}`
//! - `Decimal` renders as `{"$decimal": "..."}`
//!
//! # Examples
//!
//! ```
//! use mace::Value;
//! use mace::output::to_json;
//!
//! let value = Value::Int32(42);
//! assert_eq!(to_json(&value), "42");
//! ```

use indexmap::IndexMap;

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Int32(n) => n.to_string(),
            Value::Int64(n) => n.to_string(),
            Value::Double(n) => {
                // Keep doubles visibly doubles
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{:.1}", n)
                } else {
                    n.to_string()
                }
            }
            Value::Decimal(d) => format!("{{\"$decimal\":\"{}\"}}", d),
            Value::String(s) => format!("\"{}\"", self.escape_string(s)),
            Value::DateTime(millis) => format!("{{\"$date\":{}}}", millis),
            Value::Regex { pattern, options } => format!(
                "{{\"$regex\":\"{}\",\"$options\":\"{}\"}}",
                self.escape_string(pattern),
                self.escape_string(options)
            ),
            Value::Array(arr) => self.print_array(arr, indent),
            Value::Document(doc) => self.print_document(doc, indent),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize) -> String {
        if arr.is_empty() {
            return "[]".to_string();
        }

        if self.pretty {
            let mut result = "[\n".to_string();
            let items: Vec<String> = arr
                .iter()
                .map(|v| {
                    format!(
                        "{}{}",
                        self.indent(indent + 1),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            result.push_str(&items.join(",\n"));
            result.push('\n');
            result.push_str(&self.indent(indent));
            result.push(']');
            result
        } else {
            let items: Vec<String> = arr.iter().map(|v| self.print_value(v, indent)).collect();
            format!("[{}]", items.join(","))
        }
    }

    fn print_document(&self, doc: &IndexMap<String, Value>, indent: usize) -> String {
        if doc.is_empty() {
            return "{}".to_string();
        }

        if self.pretty {
            let mut result = "{\n".to_string();
            let items: Vec<String> = doc
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(indent + 1),
                        self.escape_string(k),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            result.push_str(&items.join(",\n"));
            result.push('\n');
            result.push_str(&self.indent(indent));
            result.push('}');
            result
        } else {
            let items: Vec<String> = doc
                .iter()
                .map(|(k, v)| {
                    format!("\"{}\":{}", self.escape_string(k), self.print_value(v, indent))
                })
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c if c.is_control() => {
                    // Unicode escape for control chars
                    format!("\\u{:04x}", c as u32).chars().collect()
                }
                c => vec![c],
            })
            .collect()
    }
}

// Convenience functions

/// Converts a wire value to compact JSON text.
///
/// Minified output with no extra whitespace, suitable for assertions and
/// log lines.
///
/// # Examples
///
/// ```
/// use mace::Value;
/// use mace::output::to_json;
///
/// let doc = Value::document([
///     ("name", Value::String("Alice".to_string())),
///     ("age", Value::Int32(30)),
/// ]);
///
/// assert_eq!(to_json(&doc), r#"{"name":"Alice","age":30}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a wire value to pretty-printed JSON text.
///
/// 2-space indentation per level, one element per line, suitable for
/// debugging output and failure messages.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
