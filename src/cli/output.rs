// Output formatting for CLI

use crate::cli::{CliResult, OutputFormat};
use serde_json::Value;
use std::io::Write;

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    pub quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output one record
    pub fn output_record(&self, record: &Value, writer: &mut impl Write) -> CliResult<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(record)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(record)?)?;
            }
            OutputFormat::KeyValue => {
                self.output_key_value(record, "", writer)?;
            }
            OutputFormat::Table => {
                self.output_table(record, writer)?;
            }
        }
        Ok(())
    }

    /// Output several records; JSON formats emit a single array
    pub fn output_records(&self, records: &[Value], writer: &mut impl Write) -> CliResult<()> {
        match self.format {
            OutputFormat::Pretty | OutputFormat::Json => {
                self.output_record(&Value::Array(records.to_vec()), writer)
            }
            OutputFormat::Table => self.output_rows(records, writer),
            OutputFormat::KeyValue => {
                for (index, record) in records.iter().enumerate() {
                    if index > 0 {
                        writeln!(writer)?;
                    }
                    self.output_key_value(record, "", writer)?;
                }
                Ok(())
            }
        }
    }

    /// Output as key-value pairs, nested objects flattened with dotted keys
    fn output_key_value(&self, record: &Value, prefix: &str, writer: &mut impl Write) -> CliResult<()> {
        if let Some(obj) = record.as_object() {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in items {
                let full_key = if prefix.is_empty() { key.clone() } else { format!("{}.{}", prefix, key) };
                if value.is_object() {
                    self.output_key_value(value, &full_key, writer)?;
                } else {
                    writeln!(writer, "{}: {}", full_key, format_value(value))?;
                }
            }
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, record: &Value, writer: &mut impl Write) -> CliResult<()> {
        if let Some(obj) = record.as_object() {
            let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;

            for (key, value) in obj {
                writeln!(writer, "{:<width$}{}", format!("{}:", key), format_value(value), width = max_key_len + 2)?;
            }

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        }
        Ok(())
    }

    /// Output records as rows under a shared header
    fn output_rows(&self, records: &[Value], writer: &mut impl Write) -> CliResult<()> {
        let Some(first) = records.first().and_then(Value::as_object) else {
            return Ok(());
        };
        let columns: Vec<&String> = first.keys().collect();
        let cells: Vec<Vec<String>> = records
            .iter()
            .map(|record| columns.iter().map(|c| format_value(&record[c.as_str()])).collect())
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| cells.iter().map(|row| row[i].len()).max().unwrap_or(0).max(c.len()))
            .collect();

        let header: Vec<String> = columns.iter().zip(&widths).map(|(c, w)| format!("{:<w$}", c, w = w)).collect();
        writeln!(writer, "{}", header.join("  ").trim_end())?;
        writeln!(writer, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)))?;
        for row in cells {
            let line: Vec<String> = row.iter().zip(&widths).map(|(v, w)| format!("{:<w$}", v, w = w)).collect();
            writeln!(writer, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(null)".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => match obj.get("kind").or_else(|| obj.get("family")).and_then(Value::as_str) {
            Some(tag) => tag.to_string(),
            None if obj.is_empty() => "{}".to_string(),
            None => format!("{{{} items}}", obj.len()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, records: &[Value]) -> String {
        let mut out = Vec::new();
        OutputFormatter::new(format, true).output_records(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_key_value_flattens() {
        let out = render(OutputFormat::KeyValue, &[json!({"channels": 2, "codec": {"kind": "native", "coding": "pcm16_le"}})]);
        assert_eq!(out, "channels: 2\ncodec.coding: pcm16_le\ncodec.kind: native\n");
    }

    #[test]
    fn test_json_array() {
        let out = render(OutputFormat::Json, &[json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(out, "[{\"a\":1},{\"a\":2}]\n");
    }

    #[test]
    fn test_rows() {
        let out = render(OutputFormat::Table, &[json!({"subsong": 1, "name": "hit"}), json!({"subsong": 10, "name": null})]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name    subsong");
        assert_eq!(lines[2], "hit     1");
        assert_eq!(lines[3], "(null)  10");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!([1, 2])), "[2 items]");
        assert_eq!(format_value(&json!({"family": "MPEG", "fsb_padding": 4})), "MPEG");
        assert_eq!(format_value(&json!({"x": 1})), "{1 items}");
    }
}
