//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their message like `format!` and hand it to any
//! [`Logger`](crate::Logger). Structured fields follow a `;` after the
//! format arguments.
//!
//! # Examples
//!
//! ```
//! use scaffold_log::prelude::*;
//! use scaffold_log::{info, warn};
//!
//! let logger = ConsoleLogger::new(Level::Info);
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With fields
//! warn!(logger, "Slow request took {}ms", 950; Field::string("path", "/orders"));
//! ```

/// Log a formatted message at an explicit level.
///
/// # Examples
///
/// ```
/// # use scaffold_log::prelude::*;
/// # let logger = ConsoleLogger::new(Level::Info);
/// use scaffold_log::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// log!(logger, Level::Warn, "Quota at {}%", 91; Field::string("tenant", "acme"));
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* ; $($field:expr),+ $(,)?) => {{
        use $crate::Logger as _;
        $logger.log($level, &format!($fmt $(, $arg)*), &[$($field),+])
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        $logger.log($level, &format!($($arg)+), &[])
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use scaffold_log::prelude::*;
/// # let logger = ConsoleLogger::new(Level::Debug);
/// use scaffold_log::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use scaffold_log::prelude::*;
/// # let logger = ConsoleLogger::new(Level::Info);
/// use scaffold_log::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message, flush, and exit the process with status 1.
///
/// ```no_run
/// # use scaffold_log::prelude::*;
/// # let logger = ConsoleLogger::new(Level::Info);
/// use scaffold_log::fatal;
/// fatal!(logger, "Unable to bind {}", "0.0.0.0:80");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $fmt:literal $(, $arg:expr)* ; $($field:expr),+ $(,)?) => {{
        use $crate::Logger as _;
        $logger.fatal(&format!($fmt $(, $arg)*), &[$($field),+])
    }};
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        $logger.fatal(&format!($($arg)+), &[])
    }};
}

/// Log a panic-level message, flush, and panic with it.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $fmt:literal $(, $arg:expr)* ; $($field:expr),+ $(,)?) => {{
        use $crate::Logger as _;
        $logger.panic(&format!($fmt $(, $arg)*), &[$($field),+])
    }};
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        $logger.panic(&format!($($arg)+), &[])
    }};
}
