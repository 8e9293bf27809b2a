use crate::error::ConfigError;
use crate::executor::TransferExecutor;
use crate::retry::Sleeper;
use crate::types::{AttemptOutcome, RunStatistics};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Number of transfers to send in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DailyTarget {
    Fixed { count: u32 },
    /// Drawn once per run.
    Range { min: u32, max: u32 },
}

impl Default for DailyTarget {
    fn default() -> Self {
        DailyTarget::Range { min: 125, max: 150 }
    }
}

impl DailyTarget {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            DailyTarget::Fixed { count: 0 } => {
                Err(ConfigError::InvalidTarget("count must be positive".into()))
            }
            DailyTarget::Range { min, max } if min == 0 || min > max => {
                Err(ConfigError::InvalidTarget(format!(
                    "range {}..={} is empty or starts at zero",
                    min, max
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match *self {
            DailyTarget::Fixed { count } => count,
            DailyTarget::Range { min, max } => rng.gen_range(min..=max),
        }
    }
}

/// Spacing between consecutive transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchedulePolicy {
    /// A day divided evenly by the target.
    #[default]
    Even,
    /// A fresh uniform delay before every transfer.
    Random { min_secs: u64, max_secs: u64 },
}

impl SchedulePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SchedulePolicy::Random { min_secs, max_secs } if min_secs > max_secs => {
                Err(ConfigError::InvalidSchedule(format!(
                    "min_secs {} exceeds max_secs {}",
                    min_secs, max_secs
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn delay<R: Rng + ?Sized>(&self, target: u32, rng: &mut R) -> Duration {
        match *self {
            SchedulePolicy::Even => DAY / target.max(1),
            SchedulePolicy::Random { min_secs, max_secs } => {
                Duration::from_secs(rng.gen_range(min_secs..=max_secs))
            }
        }
    }
}

/// Mutable state of one scheduling run.
#[derive(Debug)]
pub struct RunState {
    pub target: u32,
    pub stats: RunStatistics,
}

impl RunState {
    pub fn new(target: u32) -> Self {
        Self {
            target,
            stats: RunStatistics::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stats.done >= self.target
    }
}

/// Waits with a per-second countdown on the terminal.
pub struct Countdown;

#[async_trait]
impl Sleeper for Countdown {
    async fn sleep(&self, duration: Duration) {
        let bar = ProgressBar::new(duration.as_secs());
        bar.set_style(
            ProgressStyle::with_template("⏳ [{bar:40.cyan/blue}] next transfer in {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            bar.set_position(duration.saturating_sub(remaining).as_secs());
            bar.set_message(format!("{}s", remaining.as_secs_f64().ceil() as u64));
            tokio::time::sleep(remaining.min(Duration::from_secs(1))).await;
        }

        bar.finish_and_clear();
    }
}

pub struct Scheduler<'a> {
    executor: TransferExecutor<'a>,
    policy: SchedulePolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        executor: TransferExecutor<'a>,
        policy: SchedulePolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            executor,
            policy,
            sleeper,
        }
    }

    /// Runs transfers until `state.target` attempts have resolved. Every
    /// attempt counts toward the target whatever its outcome.
    pub async fn run<R: Rng + ?Sized>(&self, state: &mut RunState, rng: &mut R) {
        if state.is_complete() {
            info!("Daily transaction limit has been reached");
            return;
        }

        match self.policy {
            SchedulePolicy::Even => {
                let interval = self.policy.delay(state.target, rng);
                info!(
                    "Scheduled to send {} transfers today ({:.2} minutes between each)",
                    state.target,
                    interval.as_secs_f64() / 60.0
                );
            }
            SchedulePolicy::Random { min_secs, max_secs } => info!(
                "Scheduled to send {} transfers today ({}s to {}s between each)",
                state.target, min_secs, max_secs
            ),
        }

        while !state.is_complete() {
            let outcome = self.executor.execute(rng).await;
            match &outcome {
                AttemptOutcome::Succeeded(result) => debug!(
                    "Confirmed {:?} after {} submissions in {}ms",
                    result.tx_hash, result.submissions, result.duration_ms
                ),
                AttemptOutcome::Failed { submissions, .. } => {
                    debug!("Attempt failed after {} submissions", submissions)
                }
                AttemptOutcome::Skipped { .. } => {}
            }
            state.stats.record(outcome);
            info!(
                "Transfer {}/{} completed ({} succeeded, {} failed, {} skipped)",
                state.stats.done,
                state.target,
                state.stats.succeeded,
                state.stats.failed,
                state.stats.skipped
            );

            if !state.is_complete() {
                let delay = self.policy.delay(state.target, rng);
                let next_at = chrono::Duration::from_std(delay)
                    .map(|d| (chrono::Local::now() + d).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|_| "later".to_string());
                info!(
                    "Waiting {:.2} minutes before the next transfer (at {})",
                    delay.as_secs_f64() / 60.0,
                    next_at
                );
                self.sleeper.sleep(delay).await;
            }
        }

        info!(
            "All {} transfers scheduled for today have been completed",
            state.target
        );
    }
}
