//! Logger assembly from the `log.*` configuration section
//!
//! # Example
//!
//! ```
//! use scaffold_log::prelude::*;
//!
//! let config = ConfigNode::from_yaml_str(
//!     "log:\n  level: warn\n  loggers:\n    console:\n      enabled: true\n      driver: console\n",
//! )?;
//! let logger = create_logger_from_config(&Registry::with_builtins(), Some(&config))?;
//! assert_eq!(logger.name(), "console");
//! assert_eq!(logger.level(), Level::Warn);
//! # Ok::<(), scaffold_log::LoggerError>(())
//! ```

use crate::backends::{ConsoleLogger, MultiLogger};
use crate::core::{ConfigNode, Level, LoggerError, Registry, Result, SharedLogger};
use std::sync::Arc;

const LEVEL_KEY: &str = "log.level";
const LOGGERS_KEY: &str = "log.loggers";

fn default_console(level: Level) -> SharedLogger {
    Arc::new(ConsoleLogger::new(level))
}

/// Build the process logger described by `config`.
///
/// - no configuration: console at `info`
/// - no `log.loggers` section: console at `log.level`
/// - no enabled entries: console at `log.level`
/// - one enabled entry: that backend
/// - several: a [`MultiLogger`] over them, in key order
///
/// # Errors
///
/// Fails when an enabled entry names an unregistered driver, or when a
/// backend constructor rejects its entry.
pub fn create_logger_from_config(
    registry: &Registry,
    config: Option<&ConfigNode>,
) -> Result<SharedLogger> {
    let Some(config) = config else {
        return Ok(default_console(Level::Info));
    };

    let level = Level::parse_or_default(&config.get_str(LEVEL_KEY));

    let Some(section) = config.sub(LOGGERS_KEY) else {
        return Ok(default_console(level));
    };

    let mut loggers = Vec::new();
    for (name, entry) in section.entries() {
        if !entry.get_bool("enabled") {
            continue;
        }

        let driver = entry.get_str("driver");
        let constructor = registry.lookup(&driver)?;
        let logger = constructor(level, &entry).map_err(|e| LoggerError::backend_init(&name, e))?;
        loggers.push(logger);
    }

    Ok(match loggers.len() {
        0 => default_console(level),
        1 => loggers.remove(0),
        _ => Arc::new(MultiLogger::new(loggers)),
    })
}

/// [`create_logger_from_config`] with the built-in drivers
pub fn create_default_logger(config: Option<&ConfigNode>) -> Result<SharedLogger> {
    create_logger_from_config(&Registry::with_builtins(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{CaptureBuffer, FileLogger};
    use serde_json::json;

    fn assemble(value: serde_json::Value) -> Result<SharedLogger> {
        create_default_logger(Some(&ConfigNode::from_value(value)))
    }

    #[test]
    fn test_no_config_is_info_console() {
        let logger = create_default_logger(None).unwrap();
        assert_eq!(logger.name(), "console");
        assert_eq!(logger.level(), Level::Info);
    }

    #[test]
    fn test_missing_loggers_section_uses_parsed_level() {
        let logger = assemble(json!({"log": {"level": "error"}})).unwrap();
        assert_eq!(logger.name(), "console");
        assert_eq!(logger.level(), Level::Error);
    }

    #[test]
    fn test_unknown_level_is_info() {
        let logger = assemble(json!({"log": {"level": "verbose"}})).unwrap();
        assert_eq!(logger.level(), Level::Info);
    }

    #[test]
    fn test_all_disabled_falls_back_to_console() {
        let logger = assemble(json!({"log": {"level": "debug", "loggers": {
            "a": {"enabled": false, "driver": "console"},
            "b": {"driver": "file"},
        }}}))
        .unwrap();

        assert_eq!(logger.name(), "console");
        assert_eq!(logger.level(), Level::Debug);
    }

    #[test]
    fn test_single_backend_returned_directly() {
        let dir = tempfile::tempdir().unwrap();
        let logger = assemble(json!({"log": {"level": "warn", "loggers": {
            "audit": {
                "enabled": true,
                "driver": "file",
                "directory": dir.path().to_str().unwrap(),
                "filename": "audit.log",
            },
        }}}))
        .unwrap();

        assert!(logger.as_any().downcast_ref::<FileLogger>().is_some());
        assert_eq!(logger.level(), Level::Warn);
    }

    #[test]
    fn test_multiple_backends_fan_out_in_key_order() {
        let mut registry = Registry::new();
        let first = CaptureBuffer::new();
        let second = CaptureBuffer::new();
        let (a, b) = (first.clone(), second.clone());
        registry.register("first", move |level, _cfg| {
            Ok(Arc::new(ConsoleLogger::with_writer(level, a.clone(), false)) as SharedLogger)
        });
        registry.register("second", move |level, _cfg| {
            Ok(Arc::new(ConsoleLogger::with_writer(level, b.clone(), false)) as SharedLogger)
        });

        let config = ConfigNode::from_value(json!({"log": {"loggers": {
            "zz": {"enabled": true, "driver": "second"},
            "aa": {"enabled": true, "driver": "first"},
        }}}));
        let logger = create_logger_from_config(&registry, Some(&config)).unwrap();

        let multi = logger.as_any().downcast_ref::<MultiLogger>().unwrap();
        assert_eq!(multi.len(), 2);

        logger.info("to both", &[]);
        assert_eq!(first.lines().len(), 1);
        assert_eq!(second.lines().len(), 1);
    }

    #[test]
    fn test_unknown_driver_fails() {
        let err = assemble(json!({"log": {"loggers": {
            "x": {"enabled": true, "driver": "syslog"},
        }}}))
        .err()
        .unwrap();

        assert_eq!(err.to_string(), "logger driver syslog not found");
    }

    #[test]
    fn test_constructor_failure_names_entry() {
        let err = assemble(json!({"log": {"loggers": {
            "remote": {"enabled": true, "driver": "datadog", "port": "not-a-port"},
        }}}))
        .err()
        .unwrap();

        match err {
            LoggerError::BackendInit { ref name, .. } => assert_eq!(name, "remote"),
            ref other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().starts_with("failed to create logger remote: "));
    }

    #[test]
    fn test_enabled_as_string() {
        let logger = assemble(json!({"log": {"level": "debug", "loggers": {
            "dd": {"enabled": "true", "driver": "datadog", "port": 1},
        }}}))
        .unwrap();
        assert_eq!(logger.name(), "datadog");
    }
}
