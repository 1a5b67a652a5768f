//! # scaffold_log
//!
//! Pluggable structured logging for service applications.
//!
//! A single [`Logger`] capability is implemented by interchangeable backends
//! (console, rotating file, Datadog-style TCP agent) and by a fan-out over
//! several of them. The process logger is assembled from the `log.*`
//! configuration section through a [`Registry`] of driver constructors.
//!
//! ## Features
//!
//! - **Structured fields**: typed key/value pairs, context fields inherited by derived loggers
//! - **Config driven**: backends selected and tuned from YAML/JSON configuration
//! - **Pluggable**: register custom drivers next to the built-in ones
//! - **Non-blocking network shipping**: remote sends never stall the caller
//!
//! ```
//! use scaffold_log::prelude::*;
//!
//! let logger = create_default_logger(None)?;
//! let request = logger.with_context(&RequestContext::new().with_request_id("req-42"));
//! request.info("order created", &[Field::int64("order_id", 1001)]);
//! # Ok::<(), LoggerError>(())
//! ```

pub mod backends;
pub mod core;
pub mod factory;
pub mod macros;

pub mod prelude {
    pub use crate::backends::{
        ConsoleLogger, DatadogConfig, DatadogLogger, FileConfig, FileLogger, MultiLogger,
        RotationPolicy,
    };
    pub use crate::core::{
        ConfigNode, Field, FieldValue, Fields, Level, Logger, LoggerError, OutputFormat,
        Registry, RequestContext, Result, SharedLogger,
    };
    pub use crate::factory::{create_default_logger, create_logger_from_config};
}

pub use backends::{ConsoleLogger, DatadogLogger, FileLogger, MultiLogger};
pub use core::{
    ConfigNode, Constructor, Field, FieldValue, Fields, Level, Logger, LoggerError, OutputFormat,
    Record, Registry, RequestContext, Result, SharedLogger, SinkMetrics,
};
pub use factory::{create_default_logger, create_logger_from_config};
