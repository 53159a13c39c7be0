//! Daily budget rollover.
//!
//! The tracker only knows how to `reset()`; this service decides when. It
//! sleeps until the next configured UTC hour, resets, and repeats until
//! `stop()` is called.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::budget::BudgetTracker;

/// The next `hour:00:00` UTC strictly after `now`.
///
/// `hour` is clamped to `0..=23`.
pub fn next_boundary(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let boundary = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date_naive().and_time(boundary).and_utc();
    if today > now {
        today
    } else {
        today
            .checked_add_days(Days::new(1))
            .unwrap_or(today + chrono::Duration::days(1))
    }
}

/// Next boundary to reset at, never `last_reset` or one before it.
///
/// The sleep runs on the monotonic clock while boundaries come from the wall
/// clock, so waking at a boundary can still read a wall time just short of it.
fn schedule(now: DateTime<Utc>, hour: u32, last_reset: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let next = next_boundary(now, hour);
    match last_reset {
        Some(last) if next <= last => next_boundary(last, hour),
        _ => next,
    }
}

/// Background task resetting a [`BudgetTracker`] once per day.
pub struct BudgetRollover {
    budget: Arc<BudgetTracker>,
    reset_hour_utc: u32,
    shutdown: Arc<Notify>,
}

impl BudgetRollover {
    pub fn new(budget: Arc<BudgetTracker>, reset_hour_utc: u32) -> Self {
        Self {
            budget,
            reset_hour_utc,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run until [`stop`](Self::stop) is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!(reset_hour_utc = self.reset_hour_utc, "budget rollover started");

        let mut last_reset = None;
        loop {
            let now = Utc::now();
            let boundary = schedule(now, self.reset_hour_utc, last_reset);
            let wait = (boundary - now).to_std().unwrap_or(Duration::ZERO);
            debug!(%boundary, wait_secs = wait.as_secs(), "next budget rollover scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.budget.reset();
                    last_reset = Some(boundary);
                }
                _ = self.shutdown.notified() => {
                    info!("budget rollover shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Signal the running loop to exit. Takes effect even if the loop has
    /// not started waiting yet.
    pub fn stop(&self) {
        info!("stopping budget rollover");
        self.shutdown.notify_one();
    }
}
