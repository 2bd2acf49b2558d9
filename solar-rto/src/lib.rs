// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

//! Runtime Orchestration (RTO) is the coordination core of the solar clock
//!
//! # Overview
//!
//! Three units share one [`Context`]:
//!
//! - the [`InputMonitor`] forwards device input into the [`EventQueue`],
//! - the [`Refresher`] regenerates the image files on a fixed period,
//! - the [`DisplayLoop`] shows the slots in turn and skips ahead on input.
//!
//! The refresher and the display loop exclude each other through the [`ScreenLock`].
//! The [`Engine`] runs the monitor and the refresher on worker threads and the display
//! loop on the calling thread, and cancels and joins everything on shutdown.
//!
//! # Examples
//!
//! ```rust
//! use solar_rto::prelude::*;
//! use std::time::Duration;
//!
//! // A surface showing nothing
//! struct Dark;
//!
//! impl Surface for Dark {
//!     fn load(&mut self, _path: &std::path::Path) -> solar_os::OsResult<Frame> {
//!         Frame::from_rgb(1, 1, vec![0, 0, 0])
//!     }
//!
//!     fn present(&mut self, _frame: &Frame) -> solar_os::OsResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     // Rotate two slots quickly
//!     let settings = DisplaySettings {
//!         rotation: Duration::from_millis(10),
//!         tick: Duration::from_millis(2),
//!         rate_limit: Duration::from_millis(5),
//!     };
//!     let slots = vec![ImageSlot::new("earth", "earth.png"), ImageSlot::new("moon", "moon.png")];
//!     let display = DisplayLoop::new(slots, Box::new(Dark), settings).unwrap();
//!
//!     // The engine is the central runtime executor
//!     let engine = EngineBuilder::new().build().unwrap();
//!     engine.start().unwrap();
//!
//!     // Stop after a while from another thread
//!     let handle = engine.shutdown_handle();
//!     std::thread::spawn(move || {
//!         std::thread::sleep(Duration::from_millis(50));
//!         handle.shutdown();
//!     });
//!
//!     // Run the display until shut down
//!     engine.run_display(display).unwrap();
//!
//!     // Engine shutdown
//!     engine.shutdown().unwrap();
//!     engine.terminate().unwrap();
//! }
//! ```

pub mod prelude {
    pub use crate::base::*;

    pub use crate::Engine;
    pub use crate::EngineBuilder;
    pub use crate::ShutdownHandle;

    pub use crate::cancel::*;
    pub use crate::context::*;
    pub use crate::display::*;
    pub use crate::event::*;
    pub use crate::feed::*;
    pub use crate::lock::*;
    pub use crate::monitor::*;
    pub use crate::rate_limit::*;
    pub use crate::refresher::*;
    pub use crate::slot::*;

    pub use solar_os::display::{Frame, Surface};
    pub use solar_os::input::{InputEvent, InputSource};
}

pub mod rto_errors;

/// Base module for the Runtime Orchestration (RTO) stack
mod base;
pub use base::*;

/// Cancellation signal
mod cancel;
pub use cancel::*;

/// Event queue between the input monitor and the display loop
mod event;
pub use event::*;

/// The lock gating image files and the display surface
mod lock;
pub use lock::*;

mod rate_limit;
pub use rate_limit::*;

mod slot;
pub use slot::*;

/// The shared coordination context
mod context;
pub use context::*;

/// The auxiliary position feed and marker file
mod feed;
pub use feed::*;

/// Input monitor unit
mod monitor;
pub use monitor::*;

/// Refresher unit
mod refresher;
pub use refresher::*;

/// Display loop unit
mod display;
pub use display::*;

/// Engine module
mod engine;
pub use engine::{Engine, EngineBuilder, ShutdownHandle};
