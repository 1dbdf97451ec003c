// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tracing initialization: one fmt layer for the screen, one for the log
//! file, each with its own level filter, so a quiet console can coexist
//! with a verbose file.
//!
//! The file layer writes through a non-blocking appender; the returned
//! [`WorkerGuard`] must stay alive for the life of the process or buffered
//! lines are lost on exit.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LoggingConfig, parse_log_level};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoggingError {
    #[error("\"{0}\" is not a log level (debug|info|warning|error)")]
    BadLevel(String),

    #[error("log file {path} has no usable directory component")]
    BadPath { path: String },
}

/// Install the global subscriber. Returns the appender guard to park in
/// `main`.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
    let screen_level = parse_log_level(&config.loglevel_screen)
        .ok_or_else(|| LoggingError::BadLevel(config.loglevel_screen.clone()))?;
    let file_level = parse_log_level(&config.loglevel_files)
        .ok_or_else(|| LoggingError::BadLevel(config.loglevel_files.clone()))?;

    let (directory, file_name) = split_log_path(&config.file)?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let screen_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout)
        .with_filter(screen_level);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(file_level);

    tracing_subscriber::registry()
        .with(screen_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Split a configured log path into (directory, file name) for the
/// appender. A bare file name logs into the working directory.
fn split_log_path(path: &Path) -> Result<(std::path::PathBuf, String), LoggingError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::BadPath {
            path: path.display().to_string(),
        })?
        .to_string();

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    Ok((directory, file_name))
}
