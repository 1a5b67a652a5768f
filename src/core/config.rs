//! Configuration tree consumed by logger assembly
//!
//! A thin, read-only view over a parsed YAML/JSON document with dotted-path
//! lookups, mirroring the `log.*` keys of the service configuration:
//!
//! ```yaml
//! log:
//!   level: debug
//!   loggers:
//!     console:
//!       enabled: true
//!       driver: console
//!       colors: true
//!     app_file:
//!       enabled: true
//!       driver: file
//!       directory: logs
//!       filename: app.log
//! ```

use super::error::{LoggerError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// A node of the configuration tree
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    value: Value,
}

impl ConfigNode {
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Empty mapping; every lookup on it misses
    pub fn empty() -> Self {
        Self {
            value: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(source)?;
        Ok(Self::from_value(value))
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        Ok(Self::from_value(value))
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_yaml_str(&source)
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.value, |node, segment| node.get(segment))
    }

    /// Subtree at a dotted path, if it exists and is a mapping
    pub fn sub(&self, path: &str) -> Option<ConfigNode> {
        self.lookup(path)
            .filter(|v| v.is_object())
            .map(|v| ConfigNode::from_value(v.clone()))
    }

    /// String value at `path`; scalars are stringified, missing keys read as ""
    pub fn get_str(&self, path: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Boolean value at `path`; accepts `true`/`false` strings, missing reads as false
    pub fn get_bool(&self, path: &str) -> bool {
        match self.lookup(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Child mappings of this node, in sorted key order
    pub fn entries(&self) -> Vec<(String, ConfigNode)> {
        match &self.value {
            Value::Object(map) => {
                let mut entries: Vec<(String, ConfigNode)> = map
                    .iter()
                    .filter(|(_, v)| v.is_object())
                    .map(|(k, v)| (k.clone(), ConfigNode::from_value(v.clone())))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                entries
            }
            _ => Vec::new(),
        }
    }

    /// Deserialize this node into a typed backend configuration
    pub fn unmarshal<T: DeserializeOwned>(&self, component: &str) -> Result<T> {
        serde_json::from_value(self.value.clone())
            .map_err(|e| LoggerError::config(component, e.to_string()))
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

impl Default for ConfigNode {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
