//! Backend implementations

pub mod console;
pub mod datadog;
pub mod file;
pub mod multi;
pub mod rotating_file;

pub use console::{CaptureBuffer, ConsoleConfig, ConsoleLogger};
pub use datadog::{DatadogConfig, DatadogLogger, DatadogRecord};
pub use file::{ensure_log_directory, resolve_log_file_path, FileConfig, FileLogger};
pub use multi::MultiLogger;
pub use rotating_file::{RotatingFile, RotationPolicy};
