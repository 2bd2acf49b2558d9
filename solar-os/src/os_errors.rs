// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use solar_core::core_errors::OS;
use solar_core::ErrorCode;

const INPUT: ErrorCode = OS + 0x1000;
const DISPLAY: ErrorCode = OS + 0x2000;
const FILESYSTEM: ErrorCode = OS + 0x3000;
const PROCESS: ErrorCode = OS + 0x4000;
const NET: ErrorCode = OS + 0x5000;

/// The input device could not be opened
pub const INPUT_OPEN_FAILURE: ErrorCode = INPUT + 1;

/// Reading from the input device failed
pub const INPUT_READ_FAILURE: ErrorCode = INPUT + 2;

/// The display device could not be opened or probed
pub const DISPLAY_OPEN_FAILURE: ErrorCode = DISPLAY + 1;

/// An image could not be loaded or decoded
pub const IMAGE_LOAD_FAILURE: ErrorCode = DISPLAY + 2;

/// Writing a frame to the display failed
pub const DISPLAY_WRITE_FAILURE: ErrorCode = DISPLAY + 3;

/// The display pixel format is not supported
pub const DISPLAY_UNSUPPORTED_FORMAT: ErrorCode = DISPLAY + 4;

/// A file could not be written
pub const FILE_WRITE_FAILURE: ErrorCode = FILESYSTEM + 1;

/// A file could not be moved into place
pub const FILE_REPLACE_FAILURE: ErrorCode = FILESYSTEM + 2;

/// An external process could not be spawned
pub const PROCESS_SPAWN_FAILURE: ErrorCode = PROCESS + 1;

/// An external process has no command to run
pub const PROCESS_EMPTY_COMMAND: ErrorCode = PROCESS + 2;

/// A network request failed in transport
pub const NET_TRANSPORT_FAILURE: ErrorCode = NET + 1;

/// A network request was answered with an error status
pub const NET_STATUS_FAILURE: ErrorCode = NET + 2;
