// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
//

pub mod prelude;

use solar_core::core_errors;
use solar_core::{CoreResult, Error};

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file of the solar clock
pub const DEFAULT_LOG_FILE: &str = "main.log";

/// Parse a level name such as `info` or `DEBUG`
pub fn parse_level(level: &str) -> CoreResult<Level> {
    Level::from_str(level.trim()).map_err(|_| {
        Error::new(
            core_errors::INVALID_CONFIG,
            format!("Unknown log level `{level}`"),
        )
    })
}

pub struct TracingLibrary {
    log_level: Level,
    enable_logging: bool,
    log_file: Option<PathBuf>,

    /// keeps the file writer thread alive, flushing on drop
    file_guard: Option<WorkerGuard>,
}

pub struct TracingLibraryBuilder {
    log_level: Level,
    enable_logging: bool,
    log_file: Option<PathBuf>,
}

impl Default for TracingLibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLibraryBuilder {
    pub fn new() -> Self {
        Self {
            log_level: Level::INFO,
            enable_logging: false,
            log_file: None,
        }
    }

    pub fn global_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    ///
    /// Enables logging to the console
    ///
    pub fn enable_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    ///
    /// Appends all log lines to the given file
    ///
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> TracingLibrary {
        TracingLibrary {
            log_level: self.log_level,
            enable_logging: self.enable_logging,
            log_file: self.log_file,
            file_guard: None,
        }
    }
}

impl TracingLibrary {
    pub fn log_level(&self) -> Level {
        self.log_level
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Install the global subscriber.
    ///
    /// Lines carry the name of the emitting thread. `RUST_LOG` directives override
    /// the global level. The library must be kept alive for file output to be flushed.
    pub fn init_log_trace(&mut self) -> CoreResult<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.log_level).into())
            .from_env_lossy();

        let console = self.enable_logging.then(|| {
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_thread_names(true)
                .with_target(false)
        });

        let file = match &self.log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        Error::new(
                            core_errors::LOGGING_ERROR,
                            format!("Cannot open log file `{}`: {}", path.display(), e),
                        )
                    })?;

                let (writer, guard) = tracing_appender::non_blocking(file);
                self.file_guard = Some(guard);

                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_thread_names(true)
                        .with_target(false),
                )
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file)
            .try_init()
            .map_err(|e| Error::new(core_errors::LOGGING_ERROR, format!("{e}")))
    }
}
