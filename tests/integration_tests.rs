//! Integration tests for logger assembly and backends
//!
//! These tests verify:
//! - Configuration driven assembly
//! - Log injection prevention
//! - Context field inheritance across fan-out
//! - File rotation through the public API
//! - Network shipping, reconnection and loss tolerance
//! - Thread safety

use crossbeam_channel::{unbounded, Receiver};
use scaffold_log::backends::{CaptureBuffer, DatadogRecord};
use scaffold_log::prelude::*;
use scaffold_log::SinkMetrics;
use std::fs;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

/// TCP collector; the first `reject` connections are closed right after accept
fn collector(reject: usize) -> (u16, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind collector");
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = unbounded();

    thread::spawn(move || {
        for (index, stream) in listener.incoming().enumerate() {
            let Ok(stream) = stream else { break };
            if index < reject {
                drop(stream);
                continue;
            }
            let tx = tx.clone();
            thread::spawn(move || {
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
    });

    (port, rx)
}

fn datadog_metrics(logger: &SharedLogger) -> &SinkMetrics {
    logger
        .as_any()
        .downcast_ref::<DatadogLogger>()
        .expect("datadog backend")
        .metrics()
}

#[test]
fn test_console_and_file_scenario() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_dir = temp_dir.path().join("logs");
    let yaml = format!(
        r#"
log:
  level: debug
  loggers:
    c:
      enabled: true
      driver: console
      json_format: false
    f:
      enabled: true
      driver: file
      directory: {}
      filename: app.log
"#,
        log_dir.display()
    );
    let config = ConfigNode::from_yaml_str(&yaml).expect("Failed to parse config");

    let logger = create_default_logger(Some(&config)).expect("Failed to assemble logger");
    let multi = logger
        .as_any()
        .downcast_ref::<MultiLogger>()
        .expect("two backends should fan out");
    assert_eq!(multi.len(), 2);
    assert_eq!(multi.loggers()[0].name(), "console");
    assert_eq!(multi.loggers()[1].name(), "file");

    logger.info("started", &[Field::string("env", "prod")]);
    logger.flush();

    let content = fs::read_to_string(log_dir.join("app.log")).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("started"));
    assert!(lines[0].contains("env=prod"));
}

#[test]
fn test_json_file_scenario() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = ConfigNode::from_value(serde_json::json!({
        "log": {"level": "info", "loggers": {"f": {
            "enabled": true,
            "driver": "file",
            "directory": temp_dir.path().to_str().unwrap(),
            "filename": "app.json",
            "json_format": true,
        }}}
    }));

    let logger = create_default_logger(Some(&config)).unwrap();
    logger.info("started", &[Field::string("env", "prod")]);
    logger.close().unwrap();

    let content = fs::read_to_string(temp_dir.path().join("app.json")).unwrap();
    assert!(content.contains("\"env\":\"prod\""));
    let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(parsed["message"], "started");
}

#[test]
fn test_log_injection_prevention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.log");
    let logger = FileLogger::new(Level::Info, &log_file, RotationPolicy::new()).unwrap();

    // Try to inject fake log entries with newlines
    let malicious_message = "User login\nERROR [2024-10-17] Fake error injected\nINFO Continuation";
    logger.info(malicious_message, &[]);
    logger.flush();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("\\n"));
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
}

#[test]
fn test_fan_out_copies_context_per_backend() {
    let first = CaptureBuffer::new();
    let second = CaptureBuffer::new();
    let plain: SharedLogger = Arc::new(ConsoleLogger::with_writer(Level::Debug, first.clone(), false));
    let tagged = ConsoleLogger::with_writer(Level::Debug, second.clone(), false)
        .with_fields(&[Field::string("backend", "second")]);
    let multi: SharedLogger = Arc::new(MultiLogger::new(vec![plain, tagged]));

    let derived = multi.with_fields(&[Field::string("user", "alice")]);
    derived.info("call", &[Field::string("user", "bob"), Field::int("attempt", 2)]);
    multi.info("after", &[]);

    let first_lines = first.lines();
    let second_lines = second.lines();
    assert!(first_lines[0].contains("user=bob attempt=2"));
    assert!(!first_lines[0].contains("backend="));
    assert!(second_lines[0].contains("backend=second user=bob attempt=2"));
    assert!(!first_lines[1].contains("user="));
    assert!(!second_lines[1].contains("user="));
}

#[test]
fn test_request_context_fields() {
    let buffer = CaptureBuffer::new();
    let logger = ConsoleLogger::with_writer(Level::Info, buffer.clone(), false)
        .with_output_format(OutputFormat::Json);

    let ctx = RequestContext::new()
        .with_request_id("req-7")
        .with_trace("trace-1", "span-2");
    logger.with_context(&ctx).info("handled", &[]);

    let parsed: serde_json::Value = serde_json::from_str(&buffer.lines()[0]).unwrap();
    assert_eq!(parsed["request_id"], "req-7");
    assert_eq!(parsed["trace_id"], "trace-1");
    assert_eq!(parsed["span_id"], "span-2");
}

#[test]
fn test_file_rotation_limits() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("rotate.log");
    let policy = RotationPolicy::new().with_max_bytes(1024).with_max_backups(3);
    let logger = FileLogger::new(Level::Info, &log_file, policy).unwrap();

    for i in 0..500 {
        logger.info("filling the file", &[Field::int("i", i)]);
    }
    logger.flush();

    let rotated: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("rotate-"))
        .collect();
    assert_eq!(rotated.len(), 3);
    assert!(fs::metadata(&log_file).unwrap().len() <= 1024);
}

#[test]
fn test_custom_driver_registration() {
    let captured = CaptureBuffer::new();
    let sink = captured.clone();

    let mut registry = Registry::with_builtins();
    registry.register("memory", move |level, cfg| {
        let logger = ConsoleLogger::with_writer(level, sink.clone(), false);
        let prefix = cfg.get_str("prefix");
        Ok(logger.with_fields(&[Field::string("prefix", prefix)]))
    });

    let config = ConfigNode::from_yaml_str(
        "log:\n  level: warn\n  loggers:\n    mem:\n      enabled: true\n      driver: memory\n      prefix: svc\n",
    )
    .unwrap();
    let logger = create_logger_from_config(&registry, Some(&config)).unwrap();

    logger.info("hidden", &[]);
    logger.warn("visible", &[]);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("visible prefix=svc"));
}

#[test]
fn test_unknown_driver_is_configuration_error() {
    let config = ConfigNode::from_yaml_str(
        "log:\n  loggers:\n    x:\n      enabled: true\n      driver: kafka\n",
    )
    .unwrap();

    let err = create_default_logger(Some(&config)).err().expect("assembly must fail");
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "logger driver kafka not found");
}

#[test]
fn test_network_round_trip() {
    let (port, rx) = collector(0);
    let config = ConfigNode::from_value(serde_json::json!({
        "log": {"level": "debug", "loggers": {"dd": {
            "enabled": true,
            "driver": "datadog",
            "port": port,
            "service": "orders",
            "environment": "staging",
            "tags": "team:core",
            "json_format": true,
        }}}
    }));

    let logger = create_default_logger(Some(&config)).unwrap();
    logger.error(
        "payment declined",
        &[Field::string("card", "visa"), Field::int64("amount", 1250)],
    );

    let line = rx.recv_timeout(Duration::from_secs(5)).expect("line not delivered");
    let record: DatadogRecord = serde_json::from_str(&line).unwrap();
    assert_eq!(record.level, "ERROR");
    assert_eq!(record.message, "payment declined");
    assert_eq!(record.service, "orders");
    assert_eq!(record.environment, "staging");
    assert_eq!(record.source, "rust");
    assert_eq!(record.tags, "team:core");
    assert_eq!(record.fields.len(), 2);
    assert_eq!(record.fields["card"], "visa");
    assert_eq!(record.fields["amount"], 1250);

    logger.close().unwrap();
}

#[test]
fn test_network_unreachable_does_not_block() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let logger: SharedLogger = Arc::new(DatadogLogger::new(
        Level::Info,
        DatadogConfig {
            port,
            timeout: 1,
            ..Default::default()
        },
    ));

    let start = Instant::now();
    for i in 0..20 {
        logger.info("lost", &[Field::int("i", i)]);
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    let metrics = datadog_metrics(&logger);
    assert!(wait_until(|| metrics.dropped() == 20));
    assert_eq!(metrics.sent(), 0);
    assert!(logger.close().is_ok());
}

#[test]
fn test_network_reconnects_after_write_failure() {
    // The first connection is closed by the peer, later ones are read
    let (port, rx) = collector(1);
    let logger: SharedLogger = Arc::new(DatadogLogger::new(
        Level::Info,
        DatadogConfig {
            port,
            ..Default::default()
        },
    ));
    let metrics = datadog_metrics(&logger);

    let mut delivered = None;
    for i in 0..50u64 {
        logger.info("probe", &[Field::uint("seq", i)]);
        assert!(wait_until(|| metrics.completed() == i + 1));
        if let Ok(line) = rx.recv_timeout(Duration::from_millis(50)) {
            delivered = Some(line);
            break;
        }
    }

    let line = delivered.expect("no line delivered after reconnect");
    assert!(line.contains("msg=\"probe\""));
    assert!(metrics.connects() >= 2);
    assert!(metrics.dropped() >= 1);
}

#[test]
fn test_concurrent_network_logging() {
    let (port, rx) = collector(0);
    let logger: SharedLogger = Arc::new(DatadogLogger::new(
        Level::Info,
        DatadogConfig {
            port,
            json_format: true,
            ..Default::default()
        },
    ));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let logger = logger.with_fields(&[Field::int("worker", worker)]);
            thread::spawn(move || {
                for i in 0..25 {
                    logger.info("concurrent", &[Field::int("i", i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut received = 0;
    while rx.recv_timeout(Duration::from_secs(2)).is_ok() {
        received += 1;
        if received == 200 {
            break;
        }
    }

    let metrics = datadog_metrics(&logger);
    assert!(wait_until(|| metrics.completed() == 200));
    assert_eq!(received as u64, metrics.sent());
    assert_eq!(metrics.connects(), 1);
}

#[test]
fn test_concurrent_file_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("threads.log");
    let logger: SharedLogger =
        Arc::new(FileLogger::new(Level::Info, &log_file, RotationPolicy::new()).unwrap());

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.info("thread message", &[Field::int("thread", t), Field::int("i", i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.flush();

    let content = fs::read_to_string(&log_file).unwrap();
    assert_eq!(content.lines().count(), 1000);
    assert!(content.lines().all(|l| l.contains("thread message")));
}
