// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use solar_core::core_errors::RTO;
use solar_core::ErrorCode;

/// An invalid operation was requested in the current state
pub const INVALID_OPERATION: ErrorCode = RTO + 3;

/// The operation was interrupted by cancellation of the context
pub const CANCELLED: ErrorCode = RTO + 10;

/// Engine thread failed to spawn
pub const THREAD_SPAWN_ERROR: ErrorCode = RTO + 200;

/// An engine thread faulted on joining operation
pub const THREAD_JOIN_ERROR: ErrorCode = RTO + 201;

/// The input source failed and the monitor stopped
pub const INPUT_SOURCE_LOST: ErrorCode = RTO + 500;

/// The position feed could not be reached
pub const FEED_UNAVAILABLE: ErrorCode = RTO + 600;

/// The position feed reported an unsuccessful status
pub const FEED_REJECTED: ErrorCode = RTO + 601;

/// The position feed answered with a malformed payload
pub const FEED_MALFORMED: ErrorCode = RTO + 602;

/// A regeneration job exited unsuccessfully
pub const JOB_FAILED: ErrorCode = RTO + 700;

/// A regeneration job succeeded but produced no output
pub const JOB_NO_OUTPUT: ErrorCode = RTO + 701;

/// The display rotation has no slots
pub const NO_SLOTS: ErrorCode = RTO + 800;

/// The display timing settings are inconsistent
pub const INVALID_SETTINGS: ErrorCode = RTO + 801;
