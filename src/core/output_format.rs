//! Line formats shared by the console and file backends
//!
//! - Text: Human-readable format, optionally colorized
//! - Json: Machine-readable JSON object per line

use super::field::FieldValue;
use super::record::Record;
use chrono::SecondsFormat;
use colored::Colorize;

const RESERVED_JSON_KEYS: [&str; 3] = ["level", "time", "message"];

/// Output format for log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    ///
    /// Example: `2025-01-08T10:30:45.123456789Z INFO  Request processed status=200`
    #[default]
    Text,

    /// JSON format for machine processing
    ///
    /// Example: `{"level":"info","time":"2025-01-08T10:30:45Z","message":"Request processed","status":200}`
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json_format: bool) -> Self {
        if json_format {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Format a record according to this output format, without trailing newline.
    ///
    /// `use_colors` only affects text output.
    pub fn format(&self, record: &Record, use_colors: bool) -> String {
        match self {
            OutputFormat::Text => self.format_text(record, use_colors),
            OutputFormat::Json => self.format_json(record),
        }
    }

    /// Format as human-readable text
    fn format_text(&self, record: &Record, use_colors: bool) -> String {
        let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let level = if use_colors {
            format!("{:5}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:5}", record.level.to_str())
        };

        let mut line = format!("{} {} {}", timestamp, level, record.sanitized_message());

        for field in record.fields.iter() {
            let value = match &field.value {
                FieldValue::String(s) | FieldValue::Error(s) => escape_value(s),
                other => escape_value(&other.to_string()),
            };
            let key = if use_colors {
                field.key.as_str().dimmed().to_string()
            } else {
                field.key.clone()
            };
            line.push(' ');
            line.push_str(&key);
            line.push('=');
            line.push_str(&value);
        }

        line
    }

    /// Format as JSON
    fn format_json(&self, record: &Record) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(record.level.as_config_str().to_string()),
        );
        json_obj.insert(
            "time".to_string(),
            serde_json::Value::String(
                record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.clone()),
        );

        // User keys never shadow the record's own
        for field in record.fields.iter() {
            let key = if RESERVED_JSON_KEYS.contains(&field.key.as_str()) {
                format!("fields.{}", field.key)
            } else {
                field.key.clone()
            };
            json_obj.insert(key, field.value.to_json_value());
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }
}

/// Quote a value if it contains spaces, quotes or `=`
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.contains(' ') || value.contains('"') || value.contains('=') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
