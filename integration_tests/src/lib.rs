// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
//

//! Fakes for the collaborators of the solar clock, shared by the scenario tests

use solar_core::Error;
use solar_os::display::{Frame, Surface};
use solar_os::input::{InputEvent, InputSource};
use solar_os::{os_errors, OsResult};
use solar_rto::prelude::*;

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Poll `predicate` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let give_up = Instant::now() + timeout;
    while Instant::now() < give_up {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    predicate()
}

/// A key press as a touch screen reports it
pub fn touch() -> InputEvent {
    InputEvent::new(InputEvent::EV_KEY, 0x14a, 1)
}

/// An input source delivering bursts at fixed offsets from its creation
pub struct ScriptedSource {
    start: Instant,
    script: VecDeque<(Duration, Vec<InputEvent>)>,

    /// fail once the script is played
    fail_when_done: bool,
}

impl ScriptedSource {
    pub fn new(script: Vec<(Duration, Vec<InputEvent>)>) -> Self {
        Self {
            start: Instant::now(),
            script: script.into(),
            fail_when_done: false,
        }
    }

    /// A source that fails on its first read
    pub fn broken() -> Self {
        Self::new(Vec::new()).failing_when_done()
    }

    pub fn failing_when_done(mut self) -> Self {
        self.fail_when_done = true;
        self
    }
}

impl InputSource for ScriptedSource {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn read_events(&mut self, timeout: Duration) -> OsResult<Vec<InputEvent>> {
        let due = match self.script.front() {
            Some((offset, _)) => self.start + *offset,
            None if self.fail_when_done => {
                return Err(Error::const_new(
                    os_errors::INPUT_READ_FAILURE,
                    "Scripted device unplugged",
                ))
            }
            None => {
                std::thread::sleep(timeout);
                return Ok(Vec::new());
            }
        };

        let now = Instant::now();
        if due > now + timeout {
            std::thread::sleep(timeout);
            return Ok(Vec::new());
        }

        std::thread::sleep(due.saturating_duration_since(now));
        Ok(self
            .script
            .pop_front()
            .map(|(_, batch)| batch)
            .unwrap_or_default())
    }
}

/// A presented slot and when it became visible
#[derive(Debug, Clone, PartialEq)]
pub struct Shown {
    pub path: PathBuf,
    pub at: Instant,
}

/// A surface recording every presentation
#[derive(Default)]
pub struct RecordingSurface {
    shown: Arc<Mutex<Vec<Shown>>>,
    missing: HashSet<PathBuf>,
    loaded: Option<PathBuf>,

    /// time spent presenting, with the screen lock held
    present_time: Duration,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the file at `path` cannot be loaded
    pub fn with_missing(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing.insert(path.into());
        self
    }

    pub fn with_present_time(mut self, present_time: Duration) -> Self {
        self.present_time = present_time;
        self
    }

    /// The shared record of presentations
    pub fn shown(&self) -> Arc<Mutex<Vec<Shown>>> {
        self.shown.clone()
    }
}

impl Surface for RecordingSurface {
    fn load(&mut self, path: &Path) -> OsResult<Frame> {
        if self.missing.contains(path) {
            return Err(Error::new(
                os_errors::IMAGE_LOAD_FAILURE,
                format!("No image at `{}`", path.display()),
            ));
        }
        self.loaded = Some(path.to_path_buf());
        Frame::from_rgb(1, 1, vec![0, 0, 0])
    }

    fn present(&mut self, _frame: &Frame) -> OsResult<()> {
        std::thread::sleep(self.present_time);
        if let Some(path) = self.loaded.take() {
            if let Ok(mut shown) = self.shown.lock() {
                shown.push(Shown {
                    path,
                    at: Instant::now(),
                });
            }
        }
        Ok(())
    }
}

/// A regeneration job counting its runs, taking a fixed time
#[derive(Clone)]
pub struct CountingRegenerate {
    runs: Arc<AtomicUsize>,
    started: Arc<Mutex<Vec<Instant>>>,
    duration: Duration,
}

impl CountingRegenerate {
    pub fn new(duration: Duration) -> Self {
        Self {
            runs: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(Mutex::new(Vec::new())),
            duration,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Start times of all runs
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Regenerate for CountingRegenerate {
    fn regenerate(&self, _slot: &ImageSlot) -> RtoResult<()> {
        if let Ok(mut started) = self.started.lock() {
            started.push(Instant::now());
        }
        std::thread::sleep(self.duration);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A feed answering the same every time
pub struct StaticFeed {
    answer: RtoResult<Position>,
    fetches: Arc<AtomicUsize>,
}

impl StaticFeed {
    pub fn new(answer: RtoResult<Position>) -> Self {
        Self {
            answer,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetches(&self) -> Arc<AtomicUsize> {
        self.fetches.clone()
    }
}

impl PositionFeed for StaticFeed {
    fn fetch(&self, _cancel: &CancelToken) -> RtoResult<Position> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// A hold of the screen lock
#[derive(Debug, Clone, Copy)]
pub struct Hold {
    pub holder: Holder,
    pub from: Instant,
    pub until: Option<Instant>,
}

/// A lock observer recording every hold and the peak number of simultaneous holders
#[derive(Default)]
pub struct OverlapObserver {
    state: Mutex<(usize, usize, Vec<Hold>)>,
}

impl OverlapObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The highest number of holders seen at once
    pub fn peak(&self) -> usize {
        self.state.lock().map(|s| s.1).unwrap_or(usize::MAX)
    }

    pub fn holds(&self) -> Vec<Hold> {
        self.state.lock().map(|s| s.2.clone()).unwrap_or_default()
    }

    pub fn holds_of(&self, holder: Holder) -> usize {
        self.holds().iter().filter(|h| h.holder == holder).count()
    }

    /// Check that no two completed holds intersect in time
    pub fn overlapping(&self) -> bool {
        let holds = self.holds();
        holds.windows(2).any(|pair| match pair[0].until {
            Some(until) => until > pair[1].from,
            None => true,
        })
    }
}

impl LockObserver for OverlapObserver {
    fn acquired(&self, holder: Holder) {
        if let Ok(mut state) = self.state.lock() {
            state.0 += 1;
            state.1 = state.1.max(state.0);
            state.2.push(Hold {
                holder,
                from: Instant::now(),
                until: None,
            });
        }
    }

    fn released(&self, holder: Holder) {
        if let Ok(mut state) = self.state.lock() {
            state.0 = state.0.saturating_sub(1);
            if let Some(hold) = state
                .2
                .iter_mut()
                .rev()
                .find(|h| h.holder == holder && h.until.is_none())
            {
                hold.until = Some(Instant::now());
            }
        }
    }
}
