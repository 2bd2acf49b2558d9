// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// A shared cancellation signal.
///
/// Clones refer to the same signal. Once cancelled, a token stays cancelled.
/// Every sleep on the token returns early on cancellation, and every subscribed
/// `Notify` is woken so that threads parked elsewhere can observe the signal.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    /// lock free mirror of the flag for quick checks
    cancelled: AtomicBool,

    /// the flag to sleep on
    state: (Mutex<bool>, Condvar),

    /// parked objects to wake on cancellation
    subscribers: Mutex<Vec<Arc<dyn Notify>>>,
}

impl Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CancelToken({})", self.is_cancelled())
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a new token that is not cancelled
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                state: (Mutex::new(false), Condvar::new()),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Check if the token has been cancelled
    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the token and wake everything waiting on it
    pub fn cancel(&self) {
        // mirror first: waiters check the mirror before they park
        self.inner.cancelled.store(true, Ordering::Release);

        {
            let (flag, cvar) = &self.inner.state;
            let mut flag = lock_always(flag);
            *flag = true;
            cvar.notify_all();
        }

        let subscribers = lock_always(&self.inner.subscribers).clone();
        for subscriber in subscribers {
            subscriber.notify();
        }
    }

    /// Subscribe an object to be notified on cancellation.
    ///
    /// Subscribing to a cancelled token notifies immediately.
    pub fn subscribe(&self, subscriber: Arc<dyn Notify>) {
        lock_always(&self.inner.subscribers).push(subscriber.clone());

        if self.is_cancelled() {
            subscriber.notify();
        }
    }

    /// Sleep until the given timepoint.
    ///
    /// Returns `true` if the timepoint was reached and `false` if the token was cancelled.
    pub fn sleep_until(&self, timepoint: Instant) -> bool {
        let (flag, cvar) = &self.inner.state;
        let mut cancelled = lock_always(flag);

        loop {
            if *cancelled {
                return false;
            }

            let now = Instant::now();
            if now >= timepoint {
                return true;
            }

            cancelled = match cvar.wait_timeout(cancelled, timepoint - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Sleep for the given duration.
    ///
    /// Returns `true` if the full duration passed and `false` if the token was cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        match Instant::now().checked_add(duration) {
            Some(timepoint) => self.sleep_until(timepoint),
            None => {
                // beyond any representable timepoint: only cancellation ends it
                self.wait_cancelled();
                false
            }
        }
    }

    /// Block until the token is cancelled
    fn wait_cancelled(&self) {
        let (flag, cvar) = &self.inner.state;
        let mut cancelled = lock_always(flag);

        while !*cancelled {
            cancelled = match cvar.wait(cancelled) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingNotify {
        count: AtomicUsize,
    }

    impl Notify for CountingNotify {
        fn notify(&self) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn sleep_runs_full_duration() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(token.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cancel_interrupts_sleep() {
        let token = CancelToken::new();
        let clone = token.clone();

        let sleeper = std::thread::spawn(move || {
            let start = Instant::now();
            let completed = clone.sleep(Duration::from_secs(10));
            (completed, start.elapsed())
        });

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        let (completed, elapsed) = sleeper.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));

        // stays cancelled
        assert!(token.is_cancelled());
        assert!(!token.sleep(Duration::from_secs(10)));
    }

    #[test]
    fn unbounded_sleep_ends_on_cancel() {
        let token = CancelToken::new();
        let clone = token.clone();

        let sleeper = std::thread::spawn(move || clone.sleep(Duration::MAX));

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(!sleeper.join().unwrap());
    }

    #[test]
    fn subscribers_are_notified() {
        let token = CancelToken::new();
        let early = Arc::new(CountingNotify::default());
        token.subscribe(early.clone());
        assert_eq!(early.count.load(Ordering::Relaxed), 0);

        token.cancel();
        assert_eq!(early.count.load(Ordering::Relaxed), 1);

        // late subscription is notified right away
        let late = Arc::new(CountingNotify::default());
        token.subscribe(late.clone());
        assert_eq!(late.count.load(Ordering::Relaxed), 1);
    }
}
