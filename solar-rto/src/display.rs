// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;
use crate::context::Context;
use crate::event::WaitStatus;
use crate::lock::Holder;
use crate::rate_limit::RateLimiter;
use crate::rto_errors;
use crate::slot::ImageSlot;

use solar_core::prelude::*;
use solar_os::display::Surface;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timing of the display rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    /// How long a slot is shown without input
    pub rotation: Duration,

    /// Granularity of skip decisions
    pub tick: Duration,

    /// Minimum time between two accepted skips
    pub rate_limit: Duration,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            rotation: Duration::from_secs(30),
            tick: Duration::from_millis(100),
            rate_limit: Duration::from_millis(200),
        }
    }
}

impl DisplaySettings {
    /// Upper bound of every display interval
    pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Check that all intervals are positive and bounded, and a tick fits into a rotation
    pub fn validate(&self) -> RtoResult<()> {
        if self.rotation.is_zero() || self.tick.is_zero() || self.rate_limit.is_zero() {
            return Err(Error::const_new(
                rto_errors::INVALID_SETTINGS,
                "Display intervals must be positive",
            ));
        }
        if [self.rotation, self.tick, self.rate_limit]
            .iter()
            .any(|interval| *interval > Self::MAX_INTERVAL)
        {
            return Err(Error::new(
                rto_errors::INVALID_SETTINGS,
                format!("Display intervals must not exceed {:?}", Self::MAX_INTERVAL),
            ));
        }
        if self.tick > self.rotation {
            return Err(Error::new(
                rto_errors::INVALID_SETTINGS,
                format!(
                    "Tick {:?} is longer than the rotation {:?}",
                    self.tick, self.rotation
                ),
            ));
        }
        Ok(())
    }
}

/// Why the wait on a slot ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The rotation duration passed
    Timeout,

    /// An accepted skip request
    Skip,

    /// The context was cancelled
    Cancelled,
}

/// The main loop showing the slots in turn.
///
/// Each slot is loaded and presented under the screen lock. Then the loop waits for
/// the rotation duration, a skip request from the event queue, or cancellation.
/// Skip requests are decided once per tick: all events queued within a tick count
/// as one request, and requests closer than the rate limit to the last accepted one
/// are refused.
pub struct DisplayLoop {
    slots: Vec<ImageSlot>,
    surface: Box<dyn Surface>,
    settings: DisplaySettings,
    limiter: RateLimiter,

    /// index of the slot to show next
    current: usize,

    /// slots in a row that could not be shown
    failures_in_row: usize,
}

impl DisplayLoop {
    /// Create a display loop over a fixed, non-empty list of slots
    pub fn new(
        slots: Vec<ImageSlot>,
        surface: Box<dyn Surface>,
        settings: DisplaySettings,
    ) -> RtoResult<Self> {
        if slots.is_empty() {
            return Err(Error::const_new(
                rto_errors::NO_SLOTS,
                "The display rotation needs at least one slot",
            ));
        }
        settings.validate()?;

        Ok(Self {
            slots,
            surface,
            settings,
            limiter: RateLimiter::new(settings.rate_limit),
            current: 0,
            failures_in_row: 0,
        })
    }

    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    /// The slot currently shown or about to be shown
    pub fn current_slot(&self) -> &ImageSlot {
        &self.slots[self.current]
    }

    /// The time of the last accepted skip request
    pub fn last_advance(&self) -> Option<Instant> {
        self.limiter.last_advance()
    }

    /// Move to the next slot, wrapping at the end
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Load the current slot and present it, holding the screen lock.
    ///
    /// Returns `false` if the image cannot be loaded. A failure to present is fatal.
    pub fn show_current(&mut self, context: &Context) -> RtoResult<bool> {
        let slot = &self.slots[self.current];

        let _guard = context.screen().acquire(Holder::Display, context.cancel_token())?;

        let frame = match self.surface.load(slot.path()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Cannot show {}, skipping: {}", slot, e);
                return Ok(false);
            }
        };

        self.surface.present(&frame)?;
        Ok(true)
    }

    /// Wait out the rotation of the current slot.
    ///
    /// The wait blocks until the deadline passes, events are queued or the context
    /// is cancelled. Queued events are drained at the end of the tick they arrived
    /// in, where ticks are counted from the start of the wait.
    pub fn wait_for_advance(&mut self, context: &Context) -> RtoResult<Advance> {
        let start = Instant::now();
        let deadline = start.checked_add(self.settings.rotation).ok_or_else(|| {
            Error::new(
                rto_errors::INVALID_SETTINGS,
                format!("Rotation {:?} is out of range", self.settings.rotation),
            )
        })?;
        let cancel = context.cancel_token();

        loop {
            match context.events().wait(deadline, cancel)? {
                WaitStatus::Cancelled => return Ok(Advance::Cancelled),
                WaitStatus::Deadline => return Ok(Advance::Timeout),
                WaitStatus::Events => {}
            }

            if !cancel.sleep_until(self.tick_end(start, deadline)) {
                return Ok(Advance::Cancelled);
            }

            let events = context.events().drain()?;
            if events.is_empty() {
                continue;
            }

            info!("Found {} input events in the queue.", events.len());
            for event in &events {
                debug!("Got {}", event);
            }

            if self.limiter.try_accept(Instant::now()) {
                info!("Fast forward!");
                return Ok(Advance::Skip);
            }
            warn!("Trying to change too fast - refuse!");
        }
    }

    /// End of the tick running now, not later than the deadline
    fn tick_end(&self, start: Instant, deadline: Instant) -> Instant {
        let tick = self.settings.tick.as_nanos();
        let ticks = start.elapsed().as_nanos() / tick + 1;
        let offset = Duration::from_nanos(u64::try_from(ticks * tick).unwrap_or(u64::MAX));

        start.checked_add(offset).map_or(deadline, |end| end.min(deadline))
    }

    /// Show the slots in turn until the context is cancelled.
    ///
    /// A slot that cannot be loaded is skipped at once. When no slot could be shown
    /// in a whole round, the loop still waits one rotation before trying again.
    pub fn run(mut self, context: Arc<Context>) -> RtoResult<()> {
        info!("Display loop starting with {} slots", self.slots.len());

        while !context.is_cancelled() {
            info!("Displaying {}", self.current_slot());

            let shown = match self.show_current(&context) {
                Ok(shown) => shown,
                Err(e) if e.code() == rto_errors::CANCELLED => break,
                Err(e) => return Err(e),
            };

            if shown {
                self.failures_in_row = 0;
                info!("Updated display. Beginning sleep loop.");
            } else {
                self.failures_in_row += 1;
                if self.failures_in_row < self.slots.len() {
                    self.advance();
                    continue;
                }

                self.failures_in_row = 0;
                warn!("No slot could be shown, waiting one rotation");
            }

            match self.wait_for_advance(&context)? {
                Advance::Cancelled => break,
                Advance::Timeout | Advance::Skip => self.advance(),
            }
        }

        info!("Display loop stopped");
        Ok(())
    }
}
