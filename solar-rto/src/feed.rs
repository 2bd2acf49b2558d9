// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;
use crate::cancel::CancelToken;
use crate::rto_errors;

use solar_core::json::{self, JsonValue};
use solar_core::prelude::*;
use solar_os::{filesystem, net};

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

/// Status message of a successful feed answer
const SUCCESS: &str = "success";

/// A geographic position as reported by the feed.
///
/// The coordinates are kept as the decimal text the feed delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub latitude: String,
    pub longitude: String,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.latitude, self.longitude)
    }
}

/// The auxiliary data source parameterizing the regeneration jobs.
pub trait PositionFeed: Send {
    /// Fetch the current position.
    ///
    /// Errors are soft: the caller skips one refresh iteration. A fetch observing a
    /// cancelled `cancel` gives up with `rto_errors::CANCELLED`.
    fn fetch(&self, cancel: &CancelToken) -> RtoResult<Position>;
}

/// Parse a feed answer of the form
/// `{"message": "success", "iss_position": {"latitude": "33.5", "longitude": "-118.6"}}`.
///
/// Coordinates may be JSON strings or numbers.
pub fn parse_position(body: &str) -> RtoResult<Position> {
    let malformed = |what: &str| {
        Error::new(
            rto_errors::FEED_MALFORMED,
            format!("Feed answer {what}"),
        )
    };

    let value: JsonValue = body
        .parse()
        .map_err(|e| malformed(&format!("is not JSON: {e}")))?;

    let message = json::member(&value, "message")
        .and_then(|m| m.get::<String>())
        .ok_or_else(|| malformed("has no message"))?;
    if message != SUCCESS {
        return Err(Error::new(
            rto_errors::FEED_REJECTED,
            format!("Feed reports unsuccessful: {}", body.trim()),
        ));
    }

    let position = json::member(&value, "iss_position").ok_or_else(|| malformed("has no position"))?;
    let coordinate = |key: &str| {
        json::member(position, key)
            .and_then(json::scalar_text)
            .ok_or_else(|| malformed(&format!("has no {key}")))
    };

    Ok(Position {
        latitude: coordinate("latitude")?,
        longitude: coordinate("longitude")?,
    })
}

/// A position feed read from an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpPositionFeed {
    url: String,
    timeout: Duration,
}

impl HttpPositionFeed {
    /// Default bound for the whole request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HttpPositionFeed {
    /// How often a pending request checks for cancellation
    const CANCEL_POLL: Duration = Duration::from_millis(50);
}

impl PositionFeed for HttpPositionFeed {
    /// Run the request on a helper thread and wait for its answer or cancellation.
    ///
    /// A cancelled request is abandoned; its thread ends with the request timeout.
    fn fetch(&self, cancel: &CancelToken) -> RtoResult<Position> {
        if cancel.is_cancelled() {
            return Err(Error::from_code(rto_errors::CANCELLED));
        }

        let (sender, receiver) = mpsc::channel();
        let (url, timeout) = (self.url.clone(), self.timeout);

        // spawn the thread utilizing a builder (for naming)
        std::thread::Builder::new()
            .name("Solar_Feed".to_string())
            .spawn(move || {
                // the receiver is gone after cancellation
                let _ = sender.send(net::http_get(&url, timeout));
            })
            .map_err(|e| {
                Error::new(
                    rto_errors::THREAD_SPAWN_ERROR,
                    format!("Failed to spawn feed request: {e}"),
                )
            })?;

        let answer = loop {
            if cancel.is_cancelled() {
                debug!("Abandoning feed request to {}", self.url);
                return Err(Error::from_code(rto_errors::CANCELLED));
            }

            match receiver.recv_timeout(Self::CANCEL_POLL) {
                Ok(answer) => break answer,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::const_new(
                        rto_errors::FEED_UNAVAILABLE,
                        "Feed request ended without an answer",
                    ))
                }
            }
        };

        let body = answer.map_err(|e| {
            Error::new(
                rto_errors::FEED_UNAVAILABLE,
                format!("Failed to contact feed: {e}"),
            )
        })?;
        parse_position(&body)
    }
}

/// The marker file consumed by the renderer, locating an icon at a position
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFile {
    path: PathBuf,
    icon: String,
}

impl MarkerFile {
    pub fn new(path: impl Into<PathBuf>, icon: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            icon: icon.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The marker line for a position
    pub fn content(&self, position: &Position) -> String {
        format!("{} image={}", position, self.icon)
    }

    /// Replace the marker file with the line for `position`
    pub fn write(&self, position: &Position) -> RtoResult<()> {
        let content = self.content(position);
        info!("Updating marker file with {}", content);
        filesystem::write_atomic(&self.path, content.as_bytes())
    }
}
