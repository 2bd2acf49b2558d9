// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use crate::base::*;
use crate::context::Context;
use crate::feed::{MarkerFile, PositionFeed};
use crate::lock::Holder;
use crate::rto_errors;
use crate::slot::ImageSlot;

use solar_core::prelude::*;
use solar_os::filesystem;
use solar_os::process::CommandJob;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Something that rewrites the image file of a slot.
pub trait Regenerate: Send {
    /// Produce fresh content for the slot's file.
    ///
    /// On error the previous content of the file must be left in place.
    fn regenerate(&self, slot: &ImageSlot) -> RtoResult<()>;
}

/// Regeneration by an external command writing to a staging file.
///
/// The command renders into the staging path of the slot. Only if it exits with
/// status 0 and the staging file exists is the file moved over the slot's path.
#[derive(Debug, Clone)]
pub struct StagedCommand {
    job: CommandJob,
}

impl StagedCommand {
    pub fn new(job: CommandJob) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &CommandJob {
        &self.job
    }
}

impl Regenerate for StagedCommand {
    fn regenerate(&self, slot: &ImageSlot) -> RtoResult<()> {
        let staging = filesystem::staging_path(slot.path());

        // leftovers of an interrupted run must not be taken as output
        filesystem::discard(&staging);

        let status = self.job.run(&staging).inspect_err(|_| filesystem::discard(&staging))?;
        if !status.success() {
            filesystem::discard(&staging);
            return Err(Error::new(
                rto_errors::JOB_FAILED,
                format!("`{}` exited with {}", self.job, status),
            ));
        }

        if !staging.exists() {
            return Err(Error::new(
                rto_errors::JOB_NO_OUTPUT,
                format!("`{}` wrote no `{}`", self.job, staging.display()),
            ));
        }

        filesystem::replace(&staging, slot.path()).inspect_err(|_| filesystem::discard(&staging))
    }
}

/// The regeneration job of one slot
pub struct SlotJob {
    slot: ImageSlot,
    job: Box<dyn Regenerate>,
}

impl SlotJob {
    pub fn new(slot: ImageSlot, job: Box<dyn Regenerate>) -> Self {
        Self { slot, job }
    }

    pub fn slot(&self) -> &ImageSlot {
        &self.slot
    }
}

/// Result of one refresh iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The feed failed: nothing was touched
    Skipped,

    /// The jobs ran under the screen lock
    Refreshed { succeeded: usize, failed: usize },
}

/// The unit regenerating the image files on a fixed period.
pub struct Refresher {
    period: Duration,
    feed: Option<(Box<dyn PositionFeed>, MarkerFile)>,
    jobs: Vec<SlotJob>,
}

impl Refresher {
    /// Default time between two refresh iterations
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

    pub fn new(jobs: Vec<SlotJob>) -> Self {
        Self {
            period: Self::DEFAULT_PERIOD,
            feed: None,
            jobs,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Gate every iteration on the feed and write its position to the marker file
    pub fn with_feed(mut self, feed: Box<dyn PositionFeed>, marker: MarkerFile) -> Self {
        self.feed = Some((feed, marker));
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one refresh iteration.
    ///
    /// The feed is read before the screen lock is taken. A feed failure skips the
    /// iteration. Otherwise the marker file is written and every job runs, all under
    /// the lock. Job failures are logged and do not stop the other jobs.
    pub fn refresh_once(&self, context: &Context) -> RtoResult<RefreshOutcome> {
        let position = match &self.feed {
            Some((feed, _)) => match feed.fetch(context.cancel_token()) {
                Ok(position) => Some(position),
                Err(e) if e.code() == rto_errors::CANCELLED => return Err(e),
                Err(e) => {
                    warn!("Skipping image update: {}", e);
                    return Ok(RefreshOutcome::Skipped);
                }
            },
            None => None,
        };

        let _guard = context.screen().acquire(Holder::Refresher, context.cancel_token())?;
        info!("Beginning image update.");

        if let (Some((_, marker)), Some(position)) = (&self.feed, &position) {
            if let Err(e) = marker.write(position) {
                warn!("Cannot update marker file: {}", e);
            }
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for job in &self.jobs {
            if context.is_cancelled() {
                return Err(Error::from_code(rto_errors::CANCELLED));
            }

            let start = Instant::now();
            match job.job.regenerate(&job.slot) {
                Ok(()) => {
                    info!("Refreshed {} in {:?}", job.slot, start.elapsed());
                    succeeded += 1;
                }
                Err(e) => {
                    warn!("Refreshing {} failed, keeping old image: {}", job.slot, e);
                    failed += 1;
                }
            }
        }

        info!("Image update complete.");
        Ok(RefreshOutcome::Refreshed { succeeded, failed })
    }

    /// Refresh immediately, then once per period, until the context is cancelled
    pub fn run(self, context: Arc<Context>) -> RtoResult<()> {
        info!("Refresher thread reporting for duty.");

        loop {
            match self.refresh_once(&context) {
                Ok(_) => {}
                Err(e) if e.code() == rto_errors::CANCELLED => break,
                Err(e) => warn!("Image update failed: {}", e),
            }

            if !context.cancel_token().sleep(self.period) {
                break;
            }
        }

        info!("Refresher stopped");
        Ok(())
    }
}
