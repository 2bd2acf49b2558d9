// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use super::os_errors;
use super::{Error, OsResult};

use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A notification that something happened on an input device.
///
/// Consumers of the event queue only care that an event exists. The raw type,
/// code and value are carried along for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// The time the event was received from the device
    pub received_at: Instant,

    /// The raw event type (`EV_*`)
    pub kind: u16,

    /// The raw event code
    pub code: u16,

    /// The raw event value
    pub value: i32,
}

impl InputEvent {
    /// Synchronization event type
    pub const EV_SYN: u16 = 0x00;

    /// Key and button event type
    pub const EV_KEY: u16 = 0x01;

    /// Absolute axis event type
    pub const EV_ABS: u16 = 0x03;

    /// Create a new event received now
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            received_at: Instant::now(),
            kind,
            code,
            value,
        }
    }

    /// Check if this is a key or button press (not a release or repeat)
    pub fn is_press(&self) -> bool {
        self.kind == Self::EV_KEY && self.value == 1
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            Self::EV_SYN => "EV_SYN",
            Self::EV_KEY => "EV_KEY",
            Self::EV_ABS => "EV_ABS",
            _ => "EV_?",
        };
        write!(
            f,
            "{kind}({:#04x}) code {:#06x}, value {}",
            self.kind, self.code, self.value
        )
    }
}

/// A source of raw input events.
pub trait InputSource: Send {
    /// Name of the source for logging
    fn name(&self) -> String;

    /// Wait for the next events from the source.
    ///
    /// This suspends the caller until events arrive or `timeout` elapses.
    /// On timeout an empty batch is returned. An error means the source is gone.
    fn read_events(&mut self, timeout: Duration) -> OsResult<Vec<InputEvent>>;
}

/// An input source reading a Linux evdev device such as a touch screen.
pub struct EvdevSource {
    path: PathBuf,
    device: evdev::Device,
}

impl EvdevSource {
    /// Open the device at the given path
    pub fn open(path: &Path) -> OsResult<Self> {
        let device = evdev::Device::open(path).map_err(|e| {
            Error::new(
                os_errors::INPUT_OPEN_FAILURE,
                format!("Cannot open input device `{}`: {}", path.display(), e),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            device,
        })
    }
}

impl InputSource for EvdevSource {
    fn name(&self) -> String {
        match self.device.name() {
            Some(name) => format!("{} ({})", self.path.display(), name),
            None => self.path.display().to_string(),
        }
    }

    fn read_events(&mut self, timeout: Duration) -> OsResult<Vec<InputEvent>> {
        if !wait_readable(self.device.as_raw_fd(), timeout)? {
            return Ok(Vec::new());
        }

        let events = self.device.fetch_events().map_err(|e| {
            Error::new(
                os_errors::INPUT_READ_FAILURE,
                format!("Cannot read from `{}`: {}", self.path.display(), e),
            )
        })?;

        Ok(events
            .map(|event| InputEvent::new(event.event_type().0, event.code(), event.value()))
            .collect())
    }
}

/// Wait until a file descriptor becomes readable or the timeout elapses.
///
/// Returns `Ok(false)` on timeout and on signal interruption.
pub fn wait_readable(fd: RawFd, timeout: Duration) -> OsResult<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    let rc = unsafe { libc::poll(&mut pollfd, 1, millis) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(Error::new(
            os_errors::INPUT_READ_FAILURE,
            format!("poll failed: {err}"),
        ));
    }

    // timeout
    if rc == 0 {
        return Ok(false);
    }

    // readable data wins over a hang up so pending events are not lost
    if pollfd.revents & libc::POLLIN != 0 {
        return Ok(true);
    }

    if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        return Err(Error::const_new(
            os_errors::INPUT_READ_FAILURE,
            "Input device hung up",
        ));
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    #[test]
    fn press_detection() {
        assert!(InputEvent::new(InputEvent::EV_KEY, 0x14a, 1).is_press());
        assert!(!InputEvent::new(InputEvent::EV_KEY, 0x14a, 0).is_press());
        assert!(!InputEvent::new(InputEvent::EV_ABS, 0x00, 1).is_press());
        assert_eq!(
            format!("{}", InputEvent::new(InputEvent::EV_KEY, 0x14a, 1)),
            "EV_KEY(0x01) code 0x014a, value 1"
        );
    }

    #[test]
    fn wait_readable_times_out_then_sees_data() {
        let (mut writer, reader) = UnixStream::pair().unwrap();

        let start = Instant::now();
        assert!(!wait_readable(reader.as_raw_fd(), Duration::from_millis(50)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(40));

        writer.write_all(b"x").unwrap();
        assert!(wait_readable(reader.as_raw_fd(), Duration::from_millis(50)).unwrap());
    }

    #[test]
    fn hang_up_is_an_error() {
        let (writer, reader) = UnixStream::pair().unwrap();
        drop(writer);

        // a closed peer reads as end of file, which poll reports as readable or hang up
        let result = wait_readable(reader.as_raw_fd(), Duration::from_millis(50));
        assert!(matches!(result, Ok(true) | Err(_)));
    }

    #[test]
    fn opening_missing_device_fails() {
        let err = EvdevSource::open(Path::new("/nonexistent/event0"))
            .err()
            .unwrap();
        assert_eq!(err.code(), os_errors::INPUT_OPEN_FAILURE);
    }
}
