// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;
use crate::context::Context;
use crate::rto_errors;

use solar_core::prelude::*;
use solar_os::input::{InputEvent, InputSource};

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Selection of the input events that request an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// Every event from the device counts
    #[default]
    Any,

    /// Only key or touch presses count
    Press,
}

impl EventFilter {
    /// Check if the event passes the filter
    pub fn accepts(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Press => event.is_press(),
        }
    }
}

impl FromStr for EventFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(EventFilter::Any),
            "press" => Ok(EventFilter::Press),
            _ => Err(Error::new(
                solar_core::core_errors::INVALID_CONFIG,
                format!("Unknown input filter `{s}`"),
            )),
        }
    }
}

impl Display for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFilter::Any => write!(f, "any"),
            EventFilter::Press => write!(f, "press"),
        }
    }
}

/// The unit forwarding device input to the event queue.
pub struct InputMonitor {
    source: Box<dyn InputSource>,
    filter: EventFilter,

    /// upper bound of a single device wait, bounding the cancellation latency
    read_timeout: Duration,
}

impl InputMonitor {
    /// Default upper bound of a single device wait
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

    pub fn new(source: Box<dyn InputSource>) -> Self {
        Self {
            source,
            filter: EventFilter::Any,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Forward events until the context is cancelled or the source fails.
    ///
    /// A failing source ends the monitor with `rto_errors::INPUT_SOURCE_LOST`.
    /// The rest of the system keeps running on the timer alone.
    pub fn run(mut self, context: Arc<Context>) -> RtoResult<()> {
        let name = self.source.name();
        info!("Input monitor reporting for duty on {} (filter: {})", name, self.filter);

        while !context.is_cancelled() {
            let events = match self.source.read_events(self.read_timeout) {
                Ok(events) => events,
                Err(e) => {
                    error!("Input source {} lost: {}", name, e);
                    return Err(Error::new(
                        rto_errors::INPUT_SOURCE_LOST,
                        format!("Input source {name} lost: {e}"),
                    ));
                }
            };

            for event in events {
                if !self.filter.accepts(&event) {
                    continue;
                }
                debug!("From input device: {}", event);
                context.events().push(event)?;
            }
        }

        info!("Input monitor stopped");
        Ok(())
    }
}
