//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - External tool invocation logging
//! - Error and warning logging

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::process::ExitStatus;
use std::time::Duration;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("primitive gallery started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Image directory: {}", config.storage.image_dir));
    write_info(&format!("Primitive binary: {}", config.primitive.binary));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_server_stop(addr: &SocketAddr) {
    write_info(&format!("[Server] Stopped accepting on {addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_transform_start(program: &str, args: &[OsString]) {
    let args: Vec<_> = args.iter().map(|a| a.to_string_lossy()).collect();
    write_info(&format!("[Primitive] Running: {program} {}", args.join(" ")));
}

pub fn log_transform_finish(program: &str, status: ExitStatus, elapsed: Duration, output: &str) {
    let message = format!(
        "[Primitive] {program} finished with {status} in {:.3}s",
        elapsed.as_secs_f64()
    );
    if status.success() {
        write_info(&message);
    } else {
        write_error(&message);
    }
    for line in output.lines() {
        write_info(&format!("[Primitive]   {line}"));
    }
}
