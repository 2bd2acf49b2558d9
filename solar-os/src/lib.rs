// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use solar_core::Error;

/// OS error codes
pub mod os_errors;

/// OS input device access
pub mod input;

/// OS display surface access
pub mod display;

/// OS process access for external jobs
pub mod process;

/// OS file system access functions
pub mod filesystem;

/// OS network access
pub mod net;

pub mod prelude {
    pub use crate::display::{Frame, FramebufferSurface, Surface};
    pub use crate::input::{EvdevSource, InputEvent, InputSource};
    pub use crate::process::CommandJob;
    pub use crate::OsResult;
}

/// Operating system error class
pub type OsResult<T> = std::result::Result<T, Error>;
