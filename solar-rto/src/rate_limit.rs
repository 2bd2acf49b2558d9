// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

/// Minimum spacing between two accepted advance requests.
///
/// The limiter remembers the time of the last accepted request only. A rejected
/// request leaves that time untouched, so a steady stream of requests faster than
/// the interval is accepted once per interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_advance: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter that has not accepted anything yet
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_advance: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The time of the last accepted request
    pub fn last_advance(&self) -> Option<Instant> {
        self.last_advance
    }

    /// Decide on a request made at `now`.
    ///
    /// Returns `true` and records `now` if the request is accepted.
    pub fn try_accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_advance {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }

        self.last_advance = Some(now);
        true
    }
}
