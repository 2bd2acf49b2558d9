// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

//! The solar clock: cycles rendered planet images on a framebuffer, refreshes them
//! periodically and skips ahead on touch.

mod app_errors;
mod settings;

use logging_tracing::prelude::*;
use settings::Settings;
use solar_core::prelude::*;
use solar_os::display::FramebufferSurface;
use solar_os::input::EvdevSource;
use solar_rto::prelude::*;

use clap::Parser;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "solar-clock",
    about = "Cycles planet images on a framebuffer and skips ahead on touch"
)]
struct Args {
    /// JSON configuration file; built-in defaults are used without one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Global log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// File receiving the log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Also log to the console
    #[arg(long)]
    console: bool,

    /// Rotate on the timer only, without watching the input device
    #[arg(long)]
    no_input: bool,

    /// Never regenerate the images
    #[arg(long)]
    no_refresh: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("solar-clock: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> CoreResult<()> {
    let mut logging = TracingLibraryBuilder::new()
        .global_log_level(parse_level(&args.log_level)?)
        .enable_logging(args.console)
        .log_file(&args.log_file)
        .build();
    logging.init_log_trace()?;

    // log while the file writer is still alive
    serve(&args).inspect_err(|e| error!("Solar clock failed: {}", e))
}

fn serve(args: &Args) -> CoreResult<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };
    let settings = Settings::from_config(&config)?;

    let surface = FramebufferSurface::open(&settings.framebuffer)?;
    let display = DisplayLoop::new(settings.image_slots(), Box::new(surface), settings.display)?;

    let mut builder = EngineBuilder::new();

    if settings.input_enabled && !args.no_input {
        match EvdevSource::open(&settings.input_device) {
            Ok(source) => {
                builder = builder
                    .with_monitor(InputMonitor::new(Box::new(source)).with_filter(settings.input_filter));
            }
            Err(e) => warn!("Running without input: {}", e),
        }
    }

    if !args.no_refresh {
        builder = builder.with_refresher(settings.refresher());
    }

    let engine = builder.build()?;
    let (signals, watcher) = watch_signals(engine.shutdown_handle())?;

    let result = engine.run(display);

    signals.close();
    if watcher.join().is_err() {
        warn!("Signal watcher panicked");
    }

    result
}

/// Shut the engine down on the first termination signal, exit hard on the second
fn watch_signals(
    shutdown: ShutdownHandle,
) -> CoreResult<(signal_hook::iterator::Handle, std::thread::JoinHandle<()>)> {
    let setup_error = |e: std::io::Error| {
        Error::new(
            app_errors::SIGNAL_SETUP_ERROR,
            format!("Cannot install signal handlers: {e}"),
        )
    };

    let term = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        signal_hook::flag::register_conditional_shutdown(*sig, 1, Arc::clone(&term)).map_err(setup_error)?;
        signal_hook::flag::register(*sig, Arc::clone(&term)).map_err(setup_error)?;
    }

    let mut signals = Signals::new(TERM_SIGNALS).map_err(setup_error)?;
    let handle = signals.handle();

    let watcher = std::thread::Builder::new()
        .name("Solar_Signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!("Received signal {}, shutting down", signal);
                shutdown.shutdown();
            }
        })
        .map_err(setup_error)?;

    Ok((handle, watcher))
}
