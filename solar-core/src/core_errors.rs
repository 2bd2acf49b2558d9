// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use super::ErrorCode;

#[allow(dead_code)]
pub const OK: ErrorCode = 0x00000000;

pub const CORE: ErrorCode = 0x10000000;
pub const OS: ErrorCode = 0x10100000;
pub const RTO: ErrorCode = 0x10300000;

#[allow(dead_code)] // the application binary defines its own codes from here
pub const APP: ErrorCode = 0x80000000;

/// A required lock could not be acquired.
pub const LOCK_ERROR: ErrorCode = CORE + 1100;

/// Error during parsing of a string or stream.
pub const PARSE_ERROR: ErrorCode = CORE + 2000;

/// A configuration value is missing or out of range.
pub const INVALID_CONFIG: ErrorCode = CORE + 2100;

/// A configuration file could not be read.
pub const CONFIG_IO_ERROR: ErrorCode = CORE + 2101;

/// The logging backend could not be set up.
pub const LOGGING_ERROR: ErrorCode = CORE + 3000;
