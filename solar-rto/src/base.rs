// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use solar_core::prelude::*;

use std::fmt::{Debug, Display};
use std::sync::{Mutex, MutexGuard};

/// Runtime module result type
pub type RtoResult<T> = std::result::Result<T, Error>;

/// Map a poisoned mutex to the core lock error
#[inline(always)]
pub(crate) fn lock_error<T>(_: T) -> Error {
    Error::from_code(solar_core::core_errors::LOCK_ERROR)
}

/// Lock a mutex that must be released on every path, even after a panic elsewhere.
///
/// Used where giving up is worse than continuing with the inner state, e.g. in `Drop`.
#[inline(always)]
pub(crate) fn lock_always<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

//
// Events
//

/// The `Notify` trait is implemented by everything that parks threads and must
/// wake them when the coordination context is cancelled.
pub trait Notify: Send + Sync {
    /// Wake all threads waiting on the notified object
    fn notify(&self);
}

//
// Execution Elements
//

/// The ExecutionState enum represents the runtime state of the engine.
#[derive(Clone, Copy, PartialEq)]
#[repr(u32)]
pub enum ExecutionState {
    /// The engine is built and ready to start.
    Ready = 1,

    /// The engine units are running.
    Running = 2,

    /// The engine units have been joined.
    Completed = 3,

    /// The engine has been terminated.
    Terminated = 4,

    /// The engine state machine is in an invalid state.
    Err = 0xff,
}

impl ExecutionState {
    #[inline(always)]
    const fn from_u32(value: u32) -> ExecutionState {
        match value {
            1 => ExecutionState::Ready,
            2 => ExecutionState::Running,
            3 => ExecutionState::Completed,
            4 => ExecutionState::Terminated,
            _ => ExecutionState::Err,
        }
    }
}

impl From<u32> for ExecutionState {
    fn from(state: u32) -> Self {
        ExecutionState::from_u32(state)
    }
}

impl From<ExecutionState> for u32 {
    fn from(val: ExecutionState) -> Self {
        val as u32
    }
}

impl Debug for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::Ready => write!(f, "Ready"),
            ExecutionState::Running => write!(f, "Running"),
            ExecutionState::Completed => write!(f, "Completed"),
            ExecutionState::Terminated => write!(f, "Terminated"),
            ExecutionState::Err => write!(f, "Error"),
        }
    }
}

impl Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_state_roundtrip() {
        for state in [
            ExecutionState::Ready,
            ExecutionState::Running,
            ExecutionState::Completed,
            ExecutionState::Terminated,
        ] {
            assert_eq!(ExecutionState::from(u32::from(state)), state);
        }
        assert_eq!(ExecutionState::from(42), ExecutionState::Err);
        assert_eq!(format!("{}", ExecutionState::Running), "Running");
    }

    #[test]
    fn poisoned_mutex_is_still_usable() {
        let mutex = std::sync::Arc::new(Mutex::new(1));
        let clone = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.lock().map_err(lock_error).is_err());
        assert_eq!(*lock_always(&mutex), 1);
    }
}
