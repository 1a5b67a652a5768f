//! The `Logger` capability shared by every backend

use super::{context::RequestContext, error::Result, field::Field, level::Level};
use std::any::Any;
use std::sync::Arc;

/// Shared handle to a logger, constructed once at start-up and passed down
pub type SharedLogger = Arc<dyn Logger>;

/// Logging contract implemented by the console, file, Datadog and fan-out backends.
///
/// Backends implement [`Logger::log`], which emits one line and never fails or
/// blocks on remote I/O. The level methods are provided on top of it; `fatal`
/// and `panic` additionally flush and then terminate the process or unwind.
///
/// # Example
///
/// ```
/// use scaffold_log::prelude::*;
///
/// let logger = ConsoleLogger::new(Level::Info);
/// let request_logger = logger.with_fields(&[Field::string("request_id", "r-42")]);
/// request_logger.info("handled", &[Field::int("status", 200)]);
/// ```
pub trait Logger: Send + Sync {
    /// Emit one record at `level`; suppressed below the configured threshold
    fn log(&self, level: Level, message: &str, fields: &[Field]);

    /// Derive a logger carrying additional context fields
    fn with_fields(&self, fields: &[Field]) -> SharedLogger;

    /// Derive a logger bound to a request-scoped context
    fn with_context(&self, ctx: &RequestContext) -> SharedLogger;

    /// Minimum level this logger emits
    fn level(&self) -> Level;

    /// Backend name (`console`, `file`, `datadog`, `multi`, ...)
    fn name(&self) -> &str;

    /// Best-effort flush of buffered output
    fn flush(&self) {}

    /// Release resources held by the backend
    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    #[inline]
    fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[inline]
    fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[inline]
    fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[inline]
    fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Emit, flush, then exit the process with status 1
    fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        self.log(Level::Fatal, message, fields);
        self.flush();
        std::process::exit(1)
    }

    /// Emit, flush, then panic with the message
    fn panic(&self, message: &str, fields: &[Field]) -> ! {
        self.log(Level::Panic, message, fields);
        self.flush();
        panic!("{}", message)
    }
}
