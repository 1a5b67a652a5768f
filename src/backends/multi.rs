//! Fan-out over several backends

use crate::core::{Field, Level, Logger, RequestContext, Result, SharedLogger};
use std::any::Any;
use std::sync::Arc;

/// Forwards every call to each backend, in order, on the calling thread.
///
/// A terminal call (`fatal`/`panic`) lets every backend emit the line first;
/// the fan-out then flushes all of them and terminates once.
pub struct MultiLogger {
    loggers: Vec<SharedLogger>,
}

impl MultiLogger {
    pub fn new(loggers: Vec<SharedLogger>) -> Self {
        Self { loggers }
    }

    pub fn loggers(&self) -> &[SharedLogger] {
        &self.loggers
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl Logger for MultiLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        for logger in &self.loggers {
            logger.log(level, message, fields);
        }
    }

    fn with_fields(&self, fields: &[Field]) -> SharedLogger {
        Arc::new(Self::new(
            self.loggers.iter().map(|l| l.with_fields(fields)).collect(),
        ))
    }

    fn with_context(&self, ctx: &RequestContext) -> SharedLogger {
        Arc::new(Self::new(
            self.loggers.iter().map(|l| l.with_context(ctx)).collect(),
        ))
    }

    /// Most verbose threshold among the backends
    fn level(&self) -> Level {
        self.loggers
            .iter()
            .map(|l| l.level())
            .min()
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "multi"
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }

    /// Close every backend; the first failure is returned after all were tried
    fn close(&self) -> Result<()> {
        let mut first_err = None;
        for logger in &self.loggers {
            if let Err(e) = logger.close() {
                eprintln!("[LOGGER ERROR] closing {} backend failed: {}", logger.name(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
