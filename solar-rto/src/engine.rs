// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::{base::*, rto_errors};
use solar_core::prelude::*;

use crate::cancel::CancelToken;
use crate::context::Context;
use crate::display::DisplayLoop;
use crate::monitor::InputMonitor;
use crate::refresher::Refresher;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// The EngineBuilder configures an Engine
pub struct EngineBuilder {
    /// Tag of the engine, prefixing the thread names
    tag: String,

    /// The shared coordination context
    context: Option<Arc<Context>>,

    /// The input unit, if input is enabled
    monitor: Option<InputMonitor>,

    /// The refresh unit, if refreshing is enabled
    refresher: Option<Refresher>,
}

impl EngineBuilder {
    /// Create a new builder with default values.
    #[inline(always)]
    pub fn new() -> EngineBuilder {
        EngineBuilder {
            tag: "Solar".to_string(),
            context: None,
            monitor: None,
            refresher: None,
        }
    }

    /// Set the name of the engine.
    pub fn with_tag(mut self, tag: impl Into<String>) -> EngineBuilder {
        self.tag = tag.into();
        self
    }

    /// Use an existing context instead of a fresh one.
    pub fn with_context(mut self, context: Arc<Context>) -> EngineBuilder {
        self.context = Some(context);
        self
    }

    /// Run an input monitor next to the display loop.
    pub fn with_monitor(mut self, monitor: InputMonitor) -> EngineBuilder {
        self.monitor = Some(monitor);
        self
    }

    /// Run a refresher next to the display loop.
    pub fn with_refresher(mut self, refresher: Refresher) -> EngineBuilder {
        self.refresher = Some(refresher);
        self
    }

    /// Build the engine with the given configuration.
    pub fn build(self) -> RtoResult<Engine> {
        if self.tag.is_empty() {
            return Err(Error::const_new(
                rto_errors::INVALID_OPERATION,
                "Engine tag must not be empty",
            ));
        }

        Ok(Engine {
            tag: self.tag,
            context: self.context.unwrap_or_else(Context::new),
            state: AtomicU32::new(ExecutionState::Ready.into()),
            units: Mutex::new(Units {
                monitor: self.monitor,
                refresher: self.refresher,
            }),
            threads: Mutex::new(Vec::new()),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Units waiting to be started
struct Units {
    monitor: Option<InputMonitor>,
    refresher: Option<Refresher>,
}

/// Engine internal thread control structure, used by the engine to join its workers.
struct ThreadControl {
    name: String,
    handle: JoinHandle<RtoResult<()>>,
}

impl ThreadControl {
    /// Join the thread and wait for it to finish.
    /// Extract the result from the thread.
    fn join(self) -> RtoResult<()> {
        if let Ok(result) = self.handle.join() {
            result
        } else {
            Err(Error::new(
                rto_errors::THREAD_JOIN_ERROR,
                format!("Thread {} failed to join", self.name),
            ))
        }
    }
}

/// A handle stopping an engine from anywhere, e.g. a signal handler thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    cancel: CancelToken,
}

impl ShutdownHandle {
    /// Request the engine to stop
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// The engine runs the solar clock units.
///
/// The input monitor and the refresher run on named worker threads. The display loop
/// runs on the thread calling `run_display`. All units share one context, and shutting
/// the engine down cancels the context and joins the workers.
///
/// ```no_run
/// use solar_rto::prelude::*;
///
/// # fn display() -> DisplayLoop { unimplemented!() }
/// let engine = EngineBuilder::new().build().unwrap();
///
/// engine.start().unwrap(); // spawn the worker threads
/// let result = engine.run_display(display()); // blocks until shut down
/// engine.shutdown().unwrap(); // join the workers
/// engine.terminate().unwrap();
/// ```
pub struct Engine {
    tag: String,

    context: Arc<Context>,

    /// The execution state of the engine.
    /// This uses the u32 representation of the `ExecutionState` enum.
    state: AtomicU32,

    units: Mutex<Units>,

    threads: Mutex<Vec<ThreadControl>>,
}

impl Engine {
    /// Get the current state of the engine.
    #[inline(always)]
    pub fn state(&self) -> ExecutionState {
        ExecutionState::from(self.state.load(Ordering::Acquire))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The context shared by all units
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// A handle to stop the engine
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            cancel: self.context.cancel_token().clone(),
        }
    }

    fn transition(&self, from: ExecutionState, to: ExecutionState) -> RtoResult<()> {
        self.state
            .compare_exchange(from.into(), to.into(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| {
                Error::new(
                    rto_errors::INVALID_OPERATION,
                    format!(
                        "Cannot move engine to `{}` from `{}` state",
                        to,
                        ExecutionState::from(current)
                    ),
                )
            })
    }

    /// Start the engine.
    ///
    /// This spawns the worker threads of the configured units and returns.
    pub fn start(&self) -> RtoResult<ExecutionState> {
        self.transition(ExecutionState::Ready, ExecutionState::Running)?;

        let mut units = self.units.lock().map_err(lock_error)?;

        if let Some(monitor) = units.monitor.take() {
            let context = self.context.clone();
            self.spawn("InputMonitor", move || monitor.run(context))?;
        }

        if let Some(refresher) = units.refresher.take() {
            let context = self.context.clone();
            self.spawn("Refresher", move || refresher.run(context))?;
        }

        info!("Engine {} started", self.tag);
        Ok(ExecutionState::Running)
    }

    fn spawn<F>(&self, unit: &str, f: F) -> RtoResult<()>
    where
        F: FnOnce() -> RtoResult<()> + Send + 'static,
    {
        let name = format!("{}_{}", self.tag, unit);

        // spawn the thread utilizing a builder (for naming)
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|e| {
                // workers already running must not outlive a failed start
                self.context.shutdown();
                Error::new(
                    rto_errors::THREAD_SPAWN_ERROR,
                    format!("Failed to spawn {name}: {e}"),
                )
            })?;

        self.threads
            .lock()
            .map_err(lock_error)?
            .push(ThreadControl { name, handle });
        Ok(())
    }

    /// Run the display loop on the calling thread until the engine is shut down.
    ///
    /// A display error cancels the context so the workers stop as well.
    pub fn run_display(&self, display: DisplayLoop) -> RtoResult<()> {
        if self.state() != ExecutionState::Running {
            return Err(Error::new(
                rto_errors::INVALID_OPERATION,
                format!("Cannot run display in `{}` state", self.state()),
            ));
        }

        let result = display.run(self.context.clone());
        if let Err(e) = &result {
            error!("Display loop failed: {}", e);
            self.context.shutdown();
        }
        result
    }

    /// Send a stop signal to the engine and join its worker threads.
    ///
    /// Units that ended with an error are logged. A worker that panicked is reported
    /// with `rto_errors::THREAD_JOIN_ERROR` after all others have been joined.
    pub fn shutdown(&self) -> RtoResult<ExecutionState> {
        match self.state() {
            ExecutionState::Ready | ExecutionState::Running => {}
            state => {
                return Err(Error::new(
                    rto_errors::INVALID_OPERATION,
                    format!("Cannot shut down engine from `{}` state", state),
                ))
            }
        }

        self.context.shutdown();

        let threads: Vec<ThreadControl> = self.threads.lock().map_err(lock_error)?.drain(..).collect();

        let mut join_error = None;
        for thread in threads {
            let name = thread.name.clone();
            match thread.join() {
                Ok(()) => info!("{} joined", name),
                Err(e) if e.code() == rto_errors::THREAD_JOIN_ERROR => {
                    error!("{}", e);
                    join_error.get_or_insert(e);
                }
                Err(e) => warn!("{} ended with {}", name, e),
            }
        }

        self.state
            .store(ExecutionState::Completed.into(), Ordering::Release);
        info!("Engine {} completed", self.tag);

        match join_error {
            Some(e) => Err(e),
            None => Ok(ExecutionState::Completed),
        }
    }

    /// Terminate a completed engine.
    pub fn terminate(&self) -> RtoResult<ExecutionState> {
        self.transition(ExecutionState::Completed, ExecutionState::Terminated)?;
        info!("Engine {} terminated", self.tag);
        Ok(ExecutionState::Terminated)
    }

    /// Start the engine, run the display loop until shut down, join the workers and terminate.
    pub fn run(&self, display: DisplayLoop) -> RtoResult<()> {
        self.start()?;
        let displayed = self.run_display(display);
        let joined = self.shutdown();
        let terminated = self.terminate();

        displayed?;
        joined?;
        terminated.map(|_| ())
    }
}
