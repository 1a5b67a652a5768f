//! Size-bounded rotating file sink
//!
//! The active file is rotated once the next write would push it past the
//! configured size. Rotated files are renamed with a UTC timestamp suffix
//! (`app-2025-01-08T10-30-45.123.log`), optionally gzip-compressed, and pruned
//! by count and by age.

use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MEGABYTE: u64 = 1024 * 1024;

/// Timestamp layout embedded in rotated file names
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const COMPRESS_SUFFIX: &str = ".gz";

/// Rotation limits
///
/// # Examples
///
/// ```
/// use scaffold_log::backends::RotationPolicy;
///
/// // 50 MB files, keep 7 backups for at most 14 days, gzip them
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age_days(14)
///     .with_compression(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Active file size limit in bytes
    pub max_bytes: u64,
    /// Rotated files to keep; 0 keeps all
    pub max_backups: usize,
    /// Rotated files older than this are deleted; `None` keeps them
    pub max_age: Option<Duration>,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 100 * MEGABYTE,
            max_backups: 3,
            max_age: Some(days(7)),
            compress: false,
        }
    }
}

fn days(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(24 * 60 * 60))
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_bytes = megabytes.saturating_mul(MEGABYTE);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// 0 disables age-based pruning
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, count: u64) -> Self {
        self.max_age = if count == 0 { None } else { Some(days(count)) };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// A rotated file found next to the active one
#[derive(Debug, Clone)]
struct Backup {
    path: PathBuf,
    timestamp: DateTime<Utc>,
    compressed: bool,
}

/// Rotating file writer.
///
/// The file is opened lazily on the first write and reopened after `close`.
///
/// ```no_run
/// use scaffold_log::backends::{RotatingFile, RotationPolicy};
///
/// let mut sink = RotatingFile::new("logs/app.log", RotationPolicy::new());
/// sink.write_line(b"hello\n").unwrap();
/// sink.close().unwrap();
/// ```
pub struct RotatingFile {
    base_path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    current_size: u64,
    last_backup: Option<DateTime<Utc>>,
}

impl RotatingFile {
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
            policy,
            file: None,
            current_size: 0,
            last_backup: None,
        }
    }

    /// Write one complete line, rotating first if it would not fit
    ///
    /// # Errors
    ///
    /// Returns error if the line alone exceeds the size limit or the file
    /// cannot be written
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let len = line.len() as u64;
        if len > self.policy.max_bytes {
            return Err(LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.policy.max_bytes
                ),
            ));
        }

        if self.file.is_none() {
            self.open_existing_or_new(len)?;
        } else if self.current_size + len > self.policy.max_bytes {
            self.rotate_or_continue()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        file.write_all(line).map_err(|e| {
            LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += len;
        Ok(())
    }

    /// Open the active file for appending, rotating it first if `incoming` bytes would not fit
    fn open_existing_or_new(&mut self, incoming: u64) -> Result<()> {
        self.ensure_parent()?;

        let existing = match fs::metadata(&self.base_path) {
            Ok(metadata) => Some(metadata.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                ))
            }
        };

        match existing {
            Some(size) if size + incoming > self.policy.max_bytes => self.rotate_or_continue(),
            Some(size) => {
                self.file = Some(self.open_append()?);
                self.current_size = size;
                Ok(())
            }
            None => {
                self.file = Some(self.open_append()?);
                self.current_size = 0;
                Ok(())
            }
        }
    }

    /// Rotate; on failure keep writing to the current file rather than lose the line
    fn rotate_or_continue(&mut self) -> Result<()> {
        if let Err(e) = self.rotate() {
            eprintln!(
                "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                e
            );

            if self.file.is_none() {
                self.file = Some(self.open_append()?);
            }
            // Allow the file to grow past the limit instead of retrying every line
            self.current_size = 0;
        }
        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
        }
        Ok(())
    }

    fn open_append(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })
    }

    /// Close the active file, move it aside and start a fresh one
    ///
    /// # Errors
    ///
    /// Returns error if the active file cannot be renamed or recreated
    pub fn rotate(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        self.ensure_parent()?;

        if self.base_path.exists() {
            let now = match self.last_backup {
                Some(last) if last >= Utc::now() => last + ChronoDuration::milliseconds(1),
                _ => Utc::now(),
            };
            let (backup_path, stamp) = self.next_backup_path(now);
            self.last_backup = Some(stamp);
            fs::rename(&self.base_path, &backup_path).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.base_path)
            .map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to create new log file: {}", e),
                )
            })?;

        self.file = Some(file);
        self.current_size = 0;

        self.mill();
        Ok(())
    }

    /// Compress and prune rotated files per policy; failures are reported, not returned
    fn mill(&self) {
        let mut backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                eprintln!("[LOGGER WARNING] Cannot list rotated log files: {}", e);
                return;
            }
        };

        let mut expired = Vec::new();

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            expired.extend(backups.split_off(self.policy.max_backups));
        }

        if let Some(max_age) = self.policy.max_age {
            let cutoff = ChronoDuration::from_std(max_age)
                .ok()
                .and_then(|age| Utc::now().checked_sub_signed(age))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let (keep, old): (Vec<Backup>, Vec<Backup>) =
                backups.into_iter().partition(|b| b.timestamp >= cutoff);
            backups = keep;
            expired.extend(old);
        }

        for backup in &expired {
            if let Err(e) = fs::remove_file(&backup.path) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove old log file {}: {}",
                    backup.path.display(),
                    e
                );
            }
        }

        if self.policy.compress {
            for backup in backups.iter().filter(|b| !b.compressed) {
                if let Err(e) = compress_file(&backup.path) {
                    eprintln!("[LOGGER WARNING] Failed to compress rotated log: {}", e);
                }
            }
        }
    }

    /// `(stem, extension)` of the active file name, e.g. `("app", ".log")`
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app")
            .to_string();
        let ext = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_path_at(&self, at: DateTime<Utc>) -> PathBuf {
        let (stem, ext) = self.name_parts();
        self.base_path.with_file_name(format!(
            "{}-{}{}",
            stem,
            at.format(BACKUP_TIME_FORMAT),
            ext
        ))
    }

    /// Backup path for `now`, stepping forward a millisecond while the name is taken
    fn next_backup_path(&self, now: DateTime<Utc>) -> (PathBuf, DateTime<Utc>) {
        let mut at = now;
        loop {
            let candidate = self.backup_path_at(at);
            let compressed = append_suffix(&candidate, COMPRESS_SUFFIX);
            if !candidate.exists() && !compressed.exists() {
                return (candidate, at);
            }
            at += ChronoDuration::milliseconds(1);
        }
    }

    /// Rotated files belonging to this sink, newest first
    fn backups(&self) -> Result<Vec<Backup>> {
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);

        let mut backups = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            let (body, compressed) = match name.strip_suffix(COMPRESS_SUFFIX) {
                Some(body) => (body, true),
                None => (name, false),
            };
            let Some(stamp) = body
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(ext.as_str()))
            else {
                continue;
            };

            if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                backups.push(Backup {
                    path: entry.path(),
                    timestamp: naive.and_utc(),
                    compressed,
                });
            }
        }

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// Paths of rotated files currently on disk, newest first
    pub fn backup_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self.backups()?.into_iter().map(|b| b.path).collect())
    }

    /// Flush and release the file handle; safe to call repeatedly
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush()?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Bytes written to the active file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Gzip `path` to `path.gz` using streaming I/O, removing the original only on success
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter, Read};

    let gz_path = append_suffix(path, COMPRESS_SUFFIX);
    let temp_gz_path = append_suffix(path, ".gz.tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let buffered_output = BufWriter::with_capacity(64 * 1024, output);
    let mut encoder = flate2::write::GzEncoder::new(buffered_output, flate2::Compression::default());

    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            let _ = fs::remove_file(&temp_gz_path);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to read from file: {}", path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        encoder.write_all(&buffer[..bytes_read]).map_err(|e| {
            let _ = fs::remove_file(&temp_gz_path);
            LoggerError::io_operation("compress log file", "Failed to compress data chunk", e)
        })?;
    }

    let mut buffered_output = encoder.finish().map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation("compress log file", "Failed to finish compression", e)
    })?;
    buffered_output.flush().map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation("compress log file", "Failed to flush compressed file", e)
    })?;
    drop(buffered_output);

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }

    Ok(())
}
