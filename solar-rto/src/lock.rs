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

use solar_core::prelude::*;

use std::fmt::{Debug, Display};
use std::sync::{Arc, Condvar, Mutex};

/// The units that contend for the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// The background content refresher
    Refresher,

    /// The display rotation loop
    Display,
}

impl Display for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Holder::Refresher => write!(f, "Refresher"),
            Holder::Display => write!(f, "Display"),
        }
    }
}

/// Instrumentation hook on lock transitions.
///
/// Both callbacks run while the lock state is held, so observations are ordered
/// exactly like the transitions themselves. Implementations must not block.
pub trait LockObserver: Send + Sync {
    /// The holder got the lock
    fn acquired(&self, holder: Holder);

    /// The holder gave the lock back
    fn released(&self, holder: Holder);
}

/// The lock gating the image files and the display surface.
///
/// A binary lock: at most one holder owns it at a time. No fairness is promised.
/// Acquisition observes the cancel token and fails with `rto_errors::CANCELLED`
/// once it is cancelled.
pub struct ScreenLock {
    /// the current holder, locked with signalling condition
    state: (Mutex<Option<Holder>>, Condvar),

    observer: Option<Arc<dyn LockObserver>>,
}

impl Debug for ScreenLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScreenLock({:?})", self.holder().ok().flatten())
    }
}

impl Default for ScreenLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenLock {
    /// Create a new free lock
    pub fn new() -> Self {
        Self {
            state: (Mutex::new(None), Condvar::new()),
            observer: None,
        }
    }

    /// Create a new free lock reporting its transitions to the observer
    pub fn with_observer(observer: Arc<dyn LockObserver>) -> Self {
        Self {
            state: (Mutex::new(None), Condvar::new()),
            observer: Some(observer),
        }
    }

    /// The current holder, if any
    pub fn holder(&self) -> RtoResult<Option<Holder>> {
        let (state, _) = &self.state;
        Ok(*state.lock().map_err(lock_error)?)
    }

    /// Acquire the lock for `holder`, blocking until it is free or `cancel` is cancelled.
    ///
    /// The returned guard releases the lock when dropped.
    pub fn acquire(&self, holder: Holder, cancel: &CancelToken) -> RtoResult<ScreenGuard<'_>> {
        let (state, cvar) = &self.state;
        let mut current = state.lock().map_err(lock_error)?;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::from_code(rto_errors::CANCELLED));
            }

            if current.is_none() {
                *current = Some(holder);
                if let Some(observer) = &self.observer {
                    observer.acquired(holder);
                }
                return Ok(ScreenGuard { lock: self, holder });
            }

            current = cvar.wait(current).map_err(lock_error)?;
        }
    }

    /// Acquire the lock only if it is free right now
    pub fn try_acquire(&self, holder: Holder) -> RtoResult<Option<ScreenGuard<'_>>> {
        let (state, _) = &self.state;
        let mut current = state.lock().map_err(lock_error)?;

        if current.is_some() {
            return Ok(None);
        }

        *current = Some(holder);
        if let Some(observer) = &self.observer {
            observer.acquired(holder);
        }
        Ok(Some(ScreenGuard { lock: self, holder }))
    }

    fn release(&self, holder: Holder) {
        let (state, cvar) = &self.state;

        // must release even when another thread poisoned the state
        let mut current = lock_always(state);
        if let Some(observer) = &self.observer {
            observer.released(holder);
        }
        *current = None;
        cvar.notify_all();
    }
}

impl Notify for ScreenLock {
    fn notify(&self) {
        let (state, cvar) = &self.state;
        let _guard = lock_always(state);
        cvar.notify_all();
    }
}

/// Scoped ownership of the screen lock
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ScreenGuard<'a> {
    lock: &'a ScreenLock,
    holder: Holder,
}

impl ScreenGuard<'_> {
    pub fn holder(&self) -> Holder {
        self.holder
    }
}

impl Debug for ScreenGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScreenGuard({})", self.holder)
    }
}

impl Drop for ScreenGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.holder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<(bool, Holder)>>,
    }

    impl LockObserver for Journal {
        fn acquired(&self, holder: Holder) {
            self.entries.lock().unwrap().push((true, holder));
        }

        fn released(&self, holder: Holder) {
            self.entries.lock().unwrap().push((false, holder));
        }
    }

    #[test]
    fn guard_releases_on_drop() {
        let lock = ScreenLock::new();
        let cancel = CancelToken::new();

        {
            let guard = lock.acquire(Holder::Display, &cancel).unwrap();
            assert_eq!(guard.holder(), Holder::Display);
            assert_eq!(lock.holder().unwrap(), Some(Holder::Display));
            assert!(lock.try_acquire(Holder::Refresher).unwrap().is_none());
        }

        assert_eq!(lock.holder().unwrap(), None);
        assert!(lock.try_acquire(Holder::Refresher).unwrap().is_some());
    }

    #[test]
    fn second_holder_blocks_until_release() {
        let lock = Arc::new(ScreenLock::new());
        let cancel = CancelToken::new();

        let guard = lock.acquire(Holder::Display, &cancel).unwrap();

        let contender = {
            let lock = lock.clone();
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                let start = Instant::now();
                let guard = lock.acquire(Holder::Refresher, &cancel).unwrap();
                assert_eq!(guard.holder(), Holder::Refresher);
                start.elapsed()
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        drop(guard);

        let waited = contender.join().unwrap();
        assert!(waited >= Duration::from_millis(40));
        assert_eq!(lock.holder().unwrap(), None);
    }

    #[test]
    fn cancel_interrupts_acquire() {
        let lock = Arc::new(ScreenLock::new());
        let cancel = CancelToken::new();
        cancel.subscribe(lock.clone());

        let _guard = lock.acquire(Holder::Display, &cancel).unwrap();

        let contender = {
            let lock = lock.clone();
            let cancel = cancel.clone();
            std::thread::spawn(move || lock.acquire(Holder::Refresher, &cancel).map(|_| ()))
        };

        std::thread::sleep(Duration::from_millis(20));
        cancel.cancel();

        let result = contender.join().unwrap();
        assert_eq!(result.unwrap_err().code(), rto_errors::CANCELLED);
    }

    #[test]
    fn observer_sees_transitions_in_order() {
        let journal = Arc::new(Journal::default());
        let lock = ScreenLock::with_observer(journal.clone());
        let cancel = CancelToken::new();

        drop(lock.acquire(Holder::Refresher, &cancel).unwrap());
        drop(lock.acquire(Holder::Display, &cancel).unwrap());

        assert_eq!(
            *journal.entries.lock().unwrap(),
            vec![
                (true, Holder::Refresher),
                (false, Holder::Refresher),
                (true, Holder::Display),
                (false, Holder::Display),
            ]
        );
    }
}
