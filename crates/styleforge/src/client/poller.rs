//! Polls an accepted operation until it reaches a terminal state.
//!
//! The loop itself never retries failed requests: a poll rejection ends the
//! loop and propagates. The policy only governs cadence and how long to keep
//! asking while the operation is still running.

use std::time::Duration;

use log::debug;

use super::error::{ClientError, Result};
use super::{OperationKind, OperationSource, OperationStatus};

/// Cadence and bounds for a polling loop. The default reproduces the
/// service client's historical behavior: a flat one-second cadence with no
/// attempt cap. Callers that need a deadline inject `max_attempts`.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Multiplier applied to the interval after every poll; 1.0 keeps the
    /// cadence flat.
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_interval = max_interval;
        self
    }
}

/// Polls until the operation succeeds, returning the resulting resource id.
///
/// A `Failed` status is terminal and surfaces as
/// [`ClientError::OperationFailed`]; exhausting `max_attempts` surfaces as
/// [`ClientError::PollTimeout`]. Abandoning the returned future stops the
/// loop cooperatively; an in-flight request is not aborted, its result is
/// simply dropped.
pub async fn poll_until_complete<S>(
    source: &S,
    kind: OperationKind,
    operation_id: &str,
    policy: &PollPolicy,
) -> Result<String>
where
    S: OperationSource + ?Sized,
{
    let mut interval = policy.interval;

    for attempt in 1u32.. {
        let update = source.poll_once(kind, operation_id).await?;

        match update.status {
            OperationStatus::Succeeded => {
                return update.resource_id.ok_or_else(|| {
                    ClientError::MissingResourceLocation {
                        kind,
                        operation_id: operation_id.to_string(),
                    }
                });
            }
            OperationStatus::Failed => {
                return Err(ClientError::OperationFailed {
                    kind,
                    operation_id: operation_id.to_string(),
                });
            }
            status => {
                debug!(
                    "{} operation {} still {} after poll {}",
                    kind, operation_id, status, attempt
                );
            }
        }

        if let Some(max) = policy.max_attempts {
            if attempt >= max {
                return Err(ClientError::PollTimeout {
                    kind,
                    operation_id: operation_id.to_string(),
                    attempts: attempt,
                });
            }
        }

        tokio::time::sleep(interval).await;
        if policy.backoff_factor > 1.0 {
            interval = interval.mul_f64(policy.backoff_factor).min(policy.max_interval);
        }
    }

    unreachable!("poll loop only exits via return")
}
