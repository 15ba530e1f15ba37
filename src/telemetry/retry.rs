use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::Transport;
use crate::TelemetrySample;

// ---

/// Longest response body excerpt kept for logging.
const BODY_EXCERPT: usize = 200;

/// Bounded retry with exponential backoff: after failed attempt `n` the
/// sender waits `base_delay * 2^n` (2 s, 4 s, ... with the default base).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    // ---
    pub fn new(max_attempts: u32) -> Self {
        // ---
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        // ---
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3)
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The endpoint answered with a non-success status.
    Status { code: u16, body: String },
    /// The request never produced a response.
    Transport(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code, body } => write!(f, "endpoint returned {}: {}", code, body),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

/// Final outcome for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered { attempts: u32 },
    Failed { attempts: u32, reason: AttemptError },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }
}

fn is_success(status: u16) -> bool {
    status == 200 || status == 201
}

/// Send one sample, retrying per `policy`. Backoff sleeps happen inline, so
/// this can take several seconds; the sample is dropped once attempts run out.
pub async fn deliver<T: Transport>(
    transport: &T,
    policy: &RetryPolicy,
    sample: TelemetrySample,
) -> Delivery {
    // ---
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let reason = match transport.post(&sample).await {
            Ok(resp) if is_success(resp.status) => {
                debug!("Telemetry posted (attempt {})", attempt);
                return Delivery::Delivered { attempts: attempt };
            }
            Ok(resp) => AttemptError::Status {
                code: resp.status,
                body: resp.body.chars().take(BODY_EXCERPT).collect(),
            },
            Err(e) => AttemptError::Transport(format!("{:#}", e)),
        };

        warn!("Telemetry attempt {}/{} failed: {}", attempt, max, reason);

        if attempt >= max {
            error!("Failed to post telemetry after {} attempts", max);
            return Delivery::Failed {
                attempts: attempt,
                reason,
            };
        }

        let delay = policy.backoff(attempt);
        info!("Retrying in {} s", delay.as_secs());
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
