//! Backend registry mapping driver names to constructors

use super::{config::ConfigNode, error::{LoggerError, Result}, level::Level, logger::SharedLogger};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a backend from the parsed minimum level and its own config subtree
pub type Constructor = Arc<dyn Fn(Level, &ConfigNode) -> Result<SharedLogger> + Send + Sync>;

/// Driver-name → constructor table.
///
/// Populated once by the bootstrap code before any logger is assembled, then
/// only read. Registering a name twice keeps the first constructor.
///
/// # Example
///
/// ```
/// use scaffold_log::prelude::*;
///
/// let registry = Registry::with_builtins();
/// assert!(registry.contains("console"));
/// assert!(registry.lookup("syslog").is_err());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `console`, `file` and `datadog` drivers, in that order
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("console", crate::backends::console::from_config);
        registry.register("file", crate::backends::file::from_config);
        registry.register("datadog", crate::backends::datadog::from_config);
        registry
    }

    /// Record a constructor under `name`; a duplicate name is a silent no-op
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(Level, &ConfigNode) -> Result<SharedLogger> + Send + Sync + 'static,
    {
        if self.constructors.contains_key(name) {
            return;
        }
        self.constructors
            .insert(name.to_string(), Arc::new(constructor));
        self.order.push(name.to_string());
    }

    pub fn lookup(&self, name: &str) -> Result<Constructor> {
        self.constructors
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::backend_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("drivers", &self.order).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::console::ConsoleLogger;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.names(), &["console", "file", "datadog"]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        static FIRST: AtomicUsize = AtomicUsize::new(0);
        static SECOND: AtomicUsize = AtomicUsize::new(0);

        let mut registry = Registry::new();
        registry.register("custom", |level, _cfg| {
            FIRST.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ConsoleLogger::with_writer(level, std::io::sink(), false)) as SharedLogger)
        });
        registry.register("custom", |level, _cfg| {
            SECOND.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ConsoleLogger::with_writer(level, std::io::sink(), false)) as SharedLogger)
        });

        assert_eq!(registry.names().len(), 1);
        let ctor = registry.lookup("custom").unwrap();
        ctor(Level::Info, &ConfigNode::empty()).unwrap();

        assert_eq!(FIRST.load(Ordering::SeqCst), 1);
        assert_eq!(SECOND.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = Registry::new();
        match registry.lookup("nope") {
            Err(LoggerError::BackendNotFound { driver }) => assert_eq!(driver, "nope"),
            _ => panic!("expected BackendNotFound"),
        }
    }
}
