//! Log record structure

use super::field::{Field, Fields};
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One log call after context merging, ready to be rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Fields,
}

impl Record {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: Level, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
            fields: Fields::new(),
        }
    }

    /// Build a record from persistent context fields plus call-site fields.
    ///
    /// Context fields come first, oldest first; call-site fields override
    /// context fields with the same key.
    pub fn with_context(level: Level, message: &str, context: &Fields, call: &[Field]) -> Self {
        let mut record = Self::new(level, message);
        record.fields = context.merged_with(call);
        record
    }

    /// Message safe for line-framed text output; JSON renderers use `message`
    pub fn sanitized_message(&self) -> String {
        Self::sanitize_message(&self.message)
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
