//! Datadog-style TCP backend
//!
//! Ships one line per log call to a log agent listening on TCP. Delivery is
//! best effort: the connection is opened lazily, a failed write drops the line
//! and tears the connection down, and the next call reconnects. Nothing is
//! retried or queued, and the caller never waits on the network except for
//! `Fatal`/`Panic`, whose line is sent before the process goes away. Lines
//! logged while a connection attempt is in flight are dropped, so an agent
//! that swallows SYNs costs one pending dial rather than one per call.

use crate::core::{
    ConfigNode, Field, Fields, Level, Logger, Record, RequestContext, Result, SharedLogger,
    SinkMetrics,
};
use chrono::SecondsFormat;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 10518;
const DEFAULT_SERVICE: &str = "scaffold";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_SOURCE: &str = "rust";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// `log.loggers.<name>` keys understood by the `datadog` driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatadogConfig {
    pub host: String,
    pub port: u16,
    pub service: String,
    pub environment: String,
    pub source: String,
    /// Opaque tag string forwarded as-is, e.g. `team:core,tier:web`
    pub tags: String,
    /// Connect and write timeout, seconds
    pub timeout: u64,
    pub json_format: bool,
}

impl DatadogConfig {
    /// Fill unset keys with agent defaults
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        fn or_default(value: &mut String, default: &str) {
            if value.is_empty() {
                *value = default.to_string();
            }
        }

        or_default(&mut self.host, DEFAULT_HOST);
        or_default(&mut self.service, DEFAULT_SERVICE);
        or_default(&mut self.environment, DEFAULT_ENVIRONMENT);
        or_default(&mut self.source, DEFAULT_SOURCE);
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT_SECS;
        }
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// JSON line shipped in `json_format` mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatadogRecord {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub service: String,
    pub environment: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tags: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One established agent connection
struct Link {
    generation: u64,
    stream: TcpStream,
    /// Held for a whole line so concurrent senders never interleave bytes
    writer: Mutex<()>,
}

impl Link {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let _serial = self.writer.lock();
        (&self.stream).write_all(line)
    }

    fn shutdown(&self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}

/// Lazily established agent connection shared by a logger and its derivations
struct Connection {
    address: String,
    timeout: Duration,
    link: RwLock<Option<Arc<Link>>>,
    /// Set while one sender is dialing; other senders drop instead of waiting
    dialing: AtomicBool,
    generations: AtomicU64,
    metrics: SinkMetrics,
}

impl Connection {
    fn new(address: String, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            link: RwLock::new(None),
            dialing: AtomicBool::new(false),
            generations: AtomicU64::new(0),
            metrics: SinkMetrics::new(),
        }
    }

    fn dial(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in self.address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address resolved for {}", self.address),
            )
        }))
    }

    fn current(&self) -> Option<Arc<Link>> {
        self.link.read().clone()
    }

    /// Return the open link, dialing if there is none.
    ///
    /// At most one regular sender dials at a time and the lock is not held
    /// while dialing. `urgent` callers dial even when another dial is running.
    fn ensure_connected(&self, urgent: bool) -> io::Result<Arc<Link>> {
        if let Some(link) = self.current() {
            return Ok(link);
        }

        let claimed = self
            .dialing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed && !urgent {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "dial already in progress",
            ));
        }

        let result = self.connect();
        if claimed {
            self.dialing.store(false, Ordering::Release);
        }
        result
    }

    fn connect(&self) -> io::Result<Arc<Link>> {
        // A dial may have completed since the fast path
        if let Some(link) = self.current() {
            return Ok(link);
        }

        let stream = match self.dial() {
            Ok(stream) => stream,
            Err(e) => {
                self.metrics.record_connect_failure();
                return Err(e);
            }
        };

        let link = Arc::new(Link {
            generation: self.generations.fetch_add(1, Ordering::Relaxed) + 1,
            stream,
            writer: Mutex::new(()),
        });

        let mut slot = self.link.write();
        if let Some(existing) = slot.as_ref() {
            // An urgent dial raced a regular one; keep the installed link
            let _ = link.shutdown();
            return Ok(Arc::clone(existing));
        }
        *slot = Some(Arc::clone(&link));
        self.metrics.record_connect();
        Ok(link)
    }

    /// Write one line; any failure drops the line and closes the connection
    fn send(&self, line: &[u8], urgent: bool) {
        let link = match self.ensure_connected(urgent) {
            Ok(link) => link,
            Err(_) => {
                self.metrics.record_dropped();
                return;
            }
        };

        match link.write_line(line) {
            Ok(()) => {
                self.metrics.record_sent();
            }
            Err(_) => {
                self.metrics.record_dropped();
                self.teardown(link.generation);
            }
        }
    }

    /// Discard the link that failed, unless it was already replaced
    fn teardown(&self, generation: u64) {
        let mut slot = self.link.write();
        if matches!(slot.as_ref(), Some(link) if link.generation == generation) {
            if let Some(link) = slot.take() {
                let _ = link.shutdown();
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.link.read().is_some()
    }
}

/// `datadog` driver constructor
pub fn from_config(level: Level, config: &ConfigNode) -> Result<SharedLogger> {
    let config: DatadogConfig = config.unmarshal("datadog")?;
    Ok(Arc::new(DatadogLogger::new(level, config)))
}

/// Sends structured lines to a Datadog agent over TCP.
///
/// # Example
///
/// ```no_run
/// use scaffold_log::backends::{DatadogConfig, DatadogLogger};
/// use scaffold_log::prelude::*;
///
/// let config = DatadogConfig {
///     service: "billing".to_string(),
///     json_format: true,
///     ..Default::default()
/// };
/// let logger = DatadogLogger::new(Level::Info, config);
/// logger.info("invoice sent", &[Field::int64("invoice_id", 42)]);
/// ```
pub struct DatadogLogger {
    config: Arc<DatadogConfig>,
    level: Level,
    fields: Fields,
    connection: Arc<Connection>,
}

impl DatadogLogger {
    /// Create a disconnected logger; the first log call connects
    pub fn new(level: Level, config: DatadogConfig) -> Self {
        let config = config.with_defaults();
        let connection = Connection::new(config.address(), Duration::from_secs(config.timeout));
        Self {
            config: Arc::new(config),
            level,
            fields: Fields::new(),
            connection: Arc::new(connection),
        }
    }

    pub fn config(&self) -> &DatadogConfig {
        &self.config
    }

    pub fn address(&self) -> &str {
        &self.connection.address
    }

    /// Delivery counters, shared with derived loggers
    pub fn metrics(&self) -> &SinkMetrics {
        &self.connection.metrics
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn derive(&self, fields: &[Field]) -> Self {
        Self {
            config: Arc::clone(&self.config),
            level: self.level,
            fields: self.fields.merged_with(fields),
            connection: Arc::clone(&self.connection),
        }
    }

    /// Render a record in the configured wire format, without the trailing newline
    pub fn build_line(&self, record: &Record) -> String {
        let timestamp = record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        if self.config.json_format {
            self.jsonify(&timestamp, record)
        } else {
            self.plain(&timestamp, record)
        }
    }

    fn jsonify(&self, timestamp: &str, record: &Record) -> String {
        let entry = DatadogRecord {
            timestamp: timestamp.to_string(),
            level: record.level.to_str().to_string(),
            message: record.message.clone(),
            service: self.config.service.clone(),
            environment: self.config.environment.clone(),
            source: self.config.source.clone(),
            tags: self.config.tags.clone(),
            fields: record.fields.to_json_map(),
        };

        match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(_) => self.plain(timestamp, record),
        }
    }

    fn plain(&self, timestamp: &str, record: &Record) -> String {
        let mut line = format!(
            "{} {} service={} env={} source={}",
            timestamp,
            record.level.to_str(),
            self.config.service,
            self.config.environment,
            self.config.source
        );

        if !self.config.tags.is_empty() {
            line.push_str(" tags=");
            line.push_str(&self.config.tags);
        }

        for field in record.fields.iter() {
            line.push_str(&format!(" {}={}", field.key, field.value));
        }

        line.push_str(&format!(" msg=\"{}\"", record.sanitized_message()));
        line
    }

    fn dispatch(&self, level: Level, mut line: String) {
        line.push('\n');

        // The process is about to end; a detached worker would never run
        if level.is_terminal() {
            self.connection.send(line.as_bytes(), true);
            return;
        }

        let connection = Arc::clone(&self.connection);
        let spawned = thread::Builder::new()
            .name("datadog-sender".to_string())
            .spawn(move || connection.send(line.as_bytes(), false));

        if spawned.is_err() {
            self.connection.metrics.record_dropped();
        }
    }
}

impl Logger for DatadogLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if !level.passes(self.level) {
            return;
        }
        let record = Record::with_context(level, message, &self.fields, fields);
        let line = self.build_line(&record);
        self.dispatch(level, line);
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
        "datadog"
    }

    /// Close the agent connection if open; the next log call reconnects
    fn close(&self) -> Result<()> {
        let link = self.connection.link.write().take();
        if let Some(link) = link {
            match link.shutdown() {
                Ok(()) => {}
                // Peer already gone
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
