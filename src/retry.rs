use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Suspends the current task. Injected so retry and scheduling delays can be
/// observed in tests without real timers.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last_error:#}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

/// At most `max_attempts` calls, `delay` apart. No delay follows the last
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` with the 1-based attempt number until it succeeds or the cap
    /// is hit. Returns the value together with the attempts used.
    pub async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: F,
    ) -> Result<(T, u32), RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(e) => {
                    warn!("Attempt {}/{} failed: {:#}", attempt, self.max_attempts, e);
                    if attempt >= self.max_attempts {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                    info!("Retrying in {}s...", self.delay.as_secs());
                    sleeper.sleep(self.delay).await;
                }
            }
        }
    }
}
