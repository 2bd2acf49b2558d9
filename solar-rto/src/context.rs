// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::cancel::CancelToken;
use crate::event::EventQueue;
use crate::lock::{LockObserver, ScreenLock};

use solar_os::input::InputEvent;

use std::sync::Arc;

/// The coordination context shared by the monitor, the refresher and the display loop.
///
/// It is built once and handed to every unit by `Arc`. Cancelling the context wakes
/// every thread parked on the queue, the screen lock or a cancellable sleep.
#[derive(Debug)]
pub struct Context {
    events: Arc<EventQueue<InputEvent>>,
    screen: Arc<ScreenLock>,
    cancel: CancelToken,
}

impl Context {
    /// Create a new context
    pub fn new() -> Arc<Self> {
        Self::from_parts(ScreenLock::new())
    }

    /// Create a new context with an instrumented screen lock
    pub fn with_observer(observer: Arc<dyn LockObserver>) -> Arc<Self> {
        Self::from_parts(ScreenLock::with_observer(observer))
    }

    fn from_parts(screen: ScreenLock) -> Arc<Self> {
        let events = Arc::new(EventQueue::new());
        let screen = Arc::new(screen);
        let cancel = CancelToken::new();

        cancel.subscribe(events.clone());
        cancel.subscribe(screen.clone());

        Arc::new(Self {
            events,
            screen,
            cancel,
        })
    }

    /// The queue carrying input notifications to the display loop
    #[inline(always)]
    pub fn events(&self) -> &EventQueue<InputEvent> {
        &self.events
    }

    /// The lock gating image files and the display surface
    #[inline(always)]
    pub fn screen(&self) -> &ScreenLock {
        &self.screen
    }

    /// The shared cancellation signal
    #[inline(always)]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Check if the context has been cancelled
    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the context, stopping all units at their next suspension point
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WaitStatus;
    use crate::lock::Holder;
    use crate::rto_errors;
    use std::time::{Duration, Instant};

    #[test]
    fn shutdown_wakes_queue_and_lock_waiters() {
        let context = Context::new();
        let guard = context.screen().acquire(Holder::Display, context.cancel_token()).unwrap();

        let queue_waiter = {
            let context = context.clone();
            std::thread::spawn(move || {
                context
                    .events()
                    .wait(Instant::now() + Duration::from_secs(10), context.cancel_token())
                    .unwrap()
            })
        };
        let lock_waiter = {
            let context = context.clone();
            std::thread::spawn(move || {
                context
                    .screen()
                    .acquire(Holder::Refresher, context.cancel_token())
                    .map(|_| ())
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        context.shutdown();

        assert_eq!(queue_waiter.join().unwrap(), WaitStatus::Cancelled);
        assert_eq!(
            lock_waiter.join().unwrap().unwrap_err().code(),
            rto_errors::CANCELLED
        );
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(context.is_cancelled());

        drop(guard);
    }
}
