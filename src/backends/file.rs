//! File backend with size-based rotation

use super::rotating_file::{RotatingFile, RotationPolicy};
use crate::core::{
    ConfigNode, Field, Fields, Level, Logger, LoggerError, OutputFormat, Record, RequestContext,
    Result, SharedLogger,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_DIRECTORY: &str = "logs";
const DEFAULT_FILENAME: &str = "app.log";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;
const DEFAULT_MAX_AGE_DAYS: u64 = 7;

/// `log.loggers.<name>` keys understood by the `file` driver
///
/// Zero sizes and counts mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub filename: String,
    pub directory: String,
    /// Megabytes before rotation
    pub max_size: u64,
    pub max_backups: usize,
    /// Days to retain rotated files
    pub max_age: u64,
    pub compress: bool,
    pub json_format: bool,
}

impl FileConfig {
    /// Replace zero values with the defaults (100 MB, 3 backups, 7 days)
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.max_size == 0 {
            self.max_size = DEFAULT_MAX_SIZE_MB;
        }
        if self.max_backups == 0 {
            self.max_backups = DEFAULT_MAX_BACKUPS;
        }
        if self.max_age == 0 {
            self.max_age = DEFAULT_MAX_AGE_DAYS;
        }
        if self.filename.is_empty() {
            self.filename = DEFAULT_FILENAME.to_string();
        }
        self
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new()
            .with_max_size_mb(self.max_size)
            .with_max_backups(self.max_backups)
            .with_max_age_days(self.max_age)
            .with_compression(self.compress)
    }
}

/// Absolute path of the log file: an empty directory means `logs`, a relative
/// one is taken from the current working directory
pub fn resolve_log_file_path(directory: &str, filename: &str) -> Result<PathBuf> {
    let directory = if directory.is_empty() {
        DEFAULT_DIRECTORY
    } else {
        directory
    };

    let dir = Path::new(directory);
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| {
            LoggerError::io_operation("resolve log path", "cannot read working directory", e)
        })?;
        cwd.join(dir)
    };

    Ok(dir.join(filename))
}

/// Create `dir` and any missing parents
pub fn ensure_log_directory(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        LoggerError::io_operation(
            "create log directory",
            format!("Failed to create directory '{}'", dir.display()),
            e,
        )
    })
}

/// `file` driver constructor
pub fn from_config(level: Level, config: &ConfigNode) -> Result<SharedLogger> {
    let config: FileConfig = config.unmarshal("file")?;
    Ok(Arc::new(FileLogger::from_file_config(level, config)?))
}

/// Appends one line per call to a rotating file.
///
/// Derived loggers share the same file handle. Lines are never colorized.
pub struct FileLogger {
    level: Level,
    output_format: OutputFormat,
    fields: Fields,
    path: PathBuf,
    sink: Arc<Mutex<RotatingFile>>,
}

impl FileLogger {
    /// Logger writing text lines to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created
    pub fn new<P: AsRef<Path>>(level: Level, path: P, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_log_directory(parent)?;
            }
        }

        Ok(Self {
            level,
            output_format: OutputFormat::Text,
            fields: Fields::new(),
            sink: Arc::new(Mutex::new(RotatingFile::new(&path, policy))),
            path,
        })
    }

    pub fn from_file_config(level: Level, config: FileConfig) -> Result<Self> {
        let config = config.with_defaults();
        let path = resolve_log_file_path(&config.directory, &config.filename)?;
        let logger = Self::new(level, path, config.rotation_policy())?;
        Ok(logger.with_output_format(OutputFormat::from_json_flag(config.json_format)))
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RotationPolicy {
        self.sink.lock().policy().clone()
    }

    fn derive(&self, fields: &[Field]) -> Self {
        Self {
            level: self.level,
            output_format: self.output_format,
            fields: self.fields.merged_with(fields),
            path: self.path.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl Logger for FileLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if !level.passes(self.level) {
            return;
        }
        let record = Record::with_context(level, message, &self.fields, fields);
        let mut line = self.output_format.format(&record, false);
        line.push('\n');

        if let Err(e) = self.sink.lock().write_line(line.as_bytes()) {
            eprintln!("[LOGGER ERROR] file write failed: {}", e);
        }
    }

    fn with_fields(&self, fields: &[Field]) -> SharedLogger {
        Arc::new(self.derive(fields))
    }

    fn with_context(&self, ctx: &RequestContext) -> SharedLogger {
        Arc::new(self.derive(&ctx.fields()))
    }

    fn level(&self) -> Level {
        self.level
    }

    fn name(&self) -> &str {
        "file"
    }

    fn flush(&self) {
        if let Err(e) = self.sink.lock().flush() {
            eprintln!("[LOGGER ERROR] file flush failed: {}", e);
        }
    }

    /// Release the file handle; a later write reopens it
    fn close(&self) -> Result<()> {
        self.sink.lock().close()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
