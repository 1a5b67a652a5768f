//! Console backend implementation

use crate::core::{
    ConfigNode, Field, Fields, Level, Logger, OutputFormat, Record, RequestContext, Result,
    SharedLogger,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::any::Any;
use std::io::Write;
use std::sync::Arc;

/// `log.loggers.<name>` keys understood by the `console` driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub colors: bool,
    pub json_format: bool,
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes one line per call to a byte stream, standard output by default.
///
/// Derived loggers share the stream and own a copy of the context fields.
pub struct ConsoleLogger {
    level: Level,
    output_format: OutputFormat,
    use_colors: bool,
    fields: Fields,
    writer: SharedWriter,
}

/// `console` driver constructor
pub fn from_config(level: Level, config: &ConfigNode) -> Result<SharedLogger> {
    let config: ConsoleConfig = config.unmarshal("console")?;
    let logger = ConsoleLogger::with_writer(level, std::io::stdout(), config.colors)
        .with_output_format(OutputFormat::from_json_flag(config.json_format));
    Ok(Arc::new(logger))
}

impl ConsoleLogger {
    /// Colorized text logger on standard output
    pub fn new(level: Level) -> Self {
        Self::with_writer(level, std::io::stdout(), true)
    }

    pub fn with_writer<W: Write + Send + 'static>(level: Level, writer: W, colorized: bool) -> Self {
        Self {
            level,
            output_format: OutputFormat::Text,
            use_colors: colorized,
            fields: Fields::new(),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Set the output format; JSON output is never colorized
    ///
    /// # Example
    ///
    /// ```
    /// use scaffold_log::backends::ConsoleLogger;
    /// use scaffold_log::{Level, OutputFormat};
    ///
    /// let logger = ConsoleLogger::new(Level::Info).with_output_format(OutputFormat::Json);
    /// assert_eq!(logger.output_format(), OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        if format == OutputFormat::Json {
            self.use_colors = false;
        }
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    /// Persistent context fields of this logger
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn derive(&self, fields: &[Field]) -> Self {
        Self {
            level: self.level,
            output_format: self.output_format,
            use_colors: self.use_colors,
            fields: self.fields.merged_with(fields),
            writer: Arc::clone(&self.writer),
        }
    }

    fn write_line(&self, record: &Record) {
        let mut line = self.output_format.format(record, self.use_colors);
        line.push('\n');

        let mut writer = self.writer.lock();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("[LOGGER ERROR] console write failed: {}", e);
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if !level.passes(self.level) {
            return;
        }
        let record = Record::with_context(level, message, &self.fields, fields);
        self.write_line(&record);
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
        "console"
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory writer for capturing console output, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
