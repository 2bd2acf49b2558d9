// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use solar_core::core_errors::APP;
use solar_core::ErrorCode;

/// Signal handling could not be installed
pub const SIGNAL_SETUP_ERROR: ErrorCode = APP + 100;
