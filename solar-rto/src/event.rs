// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;
use crate::cancel::CancelToken;

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

/// The reason a wait on the event queue returned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitStatus {
    /// The queue holds at least one event
    Events,

    /// The deadline passed with an empty queue
    Deadline,

    /// The cancel token was cancelled
    Cancelled,
}

/// An unbounded multi-producer FIFO of events with a whole-queue drain.
///
/// Producers push single events. The consumer either drains everything that is
/// queued at once or blocks until the queue becomes non-empty, a deadline passes
/// or the context is cancelled.
pub struct EventQueue<T> {
    /// the queue, locked with signalling condition
    state: (Mutex<VecDeque<T>>, Condvar),
}

impl<T> Debug for EventQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventQueue(len: {:?})", self.len().ok())
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            state: (Mutex::new(VecDeque::new()), Condvar::new()),
        }
    }

    /// Push an event and wake the waiting consumer
    pub fn push(&self, event: T) -> RtoResult<()> {
        let (queue, cvar) = &self.state;

        // acquire the lock
        let mut queue = queue.lock().map_err(lock_error)?;
        queue.push_back(event);

        // we hold the lock: signal waiting threads
        cvar.notify_all();
        Ok(())
    }

    /// Take every queued event at once, in arrival order
    pub fn drain(&self) -> RtoResult<Vec<T>> {
        let (queue, _) = &self.state;
        let mut queue = queue.lock().map_err(lock_error)?;
        Ok(queue.drain(..).collect())
    }

    /// Number of queued events
    pub fn len(&self) -> RtoResult<usize> {
        let (queue, _) = &self.state;
        Ok(queue.lock().map_err(lock_error)?.len())
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> RtoResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Block until the queue holds an event, the deadline passes or `cancel` is cancelled.
    ///
    /// The queue is left untouched. Cancellation takes precedence over queued events,
    /// queued events take precedence over the deadline.
    pub fn wait(&self, deadline: Instant, cancel: &CancelToken) -> RtoResult<WaitStatus> {
        let (queue, cvar) = &self.state;

        // guard
        let mut queue = queue.lock().map_err(lock_error)?;

        loop {
            if cancel.is_cancelled() {
                return Ok(WaitStatus::Cancelled);
            }

            if !queue.is_empty() {
                return Ok(WaitStatus::Events);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitStatus::Deadline);
            }

            // wait (spurious wakeups just loop)
            queue = cvar.wait_timeout(queue, deadline - now).map_err(lock_error)?.0;
        }
    }
}

impl<T: Send> Notify for EventQueue<T> {
    fn notify(&self) {
        let (queue, cvar) = &self.state;
        let _guard = lock_always(queue);
        cvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn drain_takes_everything_in_order() {
        let queue = EventQueue::new();
        assert!(queue.is_empty().unwrap());

        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();
        assert_eq!(queue.len().unwrap(), 3);

        assert_eq!(queue.drain().unwrap(), vec![1, 2, 3]);
        assert!(queue.is_empty().unwrap());
        assert_eq!(queue.drain().unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn wait_returns_immediately_with_events() {
        let queue = EventQueue::new();
        queue.push(()).unwrap();

        let status = queue
            .wait(Instant::now() + Duration::from_secs(10), &CancelToken::new())
            .unwrap();
        assert_eq!(status, WaitStatus::Events);

        // waiting does not consume
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn wait_times_out() {
        let queue = EventQueue::<()>::new();
        let start = Instant::now();
        let status = queue
            .wait(start + Duration::from_millis(30), &CancelToken::new())
            .unwrap();
        assert_eq!(status, WaitStatus::Deadline);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn push_wakes_waiter() {
        let queue = Arc::new(EventQueue::new());
        let producer = queue.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(7).unwrap();
        });

        let start = Instant::now();
        let status = queue
            .wait(start + Duration::from_secs(10), &CancelToken::new())
            .unwrap();
        assert_eq!(status, WaitStatus::Events);
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn cancel_wakes_waiter() {
        let queue = Arc::new(EventQueue::<()>::new());
        let token = CancelToken::new();
        token.subscribe(queue.clone());

        let canceller = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let start = Instant::now();
        let status = queue.wait(start + Duration::from_secs(10), &token).unwrap();
        assert_eq!(status, WaitStatus::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn concurrent_producers() {
        let queue = Arc::new(EventQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(p * 1000 + i).unwrap();
                    }
                })
            })
            .collect();

        let mut drained = 0;
        for producer in producers {
            producer.join().unwrap();
        }
        drained += queue.drain().unwrap().len();
        assert_eq!(drained, 1000);
    }
}
