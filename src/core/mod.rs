//! Core logger types and traits

pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod record;
pub mod registry;

pub use config::ConfigNode;
pub use context::RequestContext;
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue, Fields};
pub use level::Level;
pub use logger::{Logger, SharedLogger};
pub use metrics::SinkMetrics;
pub use output_format::OutputFormat;
pub use record::Record;
pub use registry::{Constructor, Registry};
