//! Retry policy with exponential backoff.
//!
//! Combines the classifier's verdict with the job's retry count. The delay
//! is advisory: it is handed back to the scheduler, never slept on here.

use menu_export_models::{ErrorClassification, RetryDecision};

use crate::classifier::classify;
use crate::error::{WorkerError, WorkerResult};
use crate::failure::Failure;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry decisions before a failure becomes terminal.
    pub max_retries: u32,
    /// Delay for the first retry, in seconds (doubles each attempt).
    pub base_delay_secs: u64,
    /// Upper bound on any delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 30,
            max_delay_secs: 300,
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay_secs(mut self, base_delay_secs: u64) -> Self {
        self.base_delay_secs = base_delay_secs;
        self
    }

    /// Set the delay cap.
    pub fn with_max_delay_secs(mut self, max_delay_secs: u64) -> Self {
        self.max_delay_secs = max_delay_secs;
        self
    }

    /// Delays must be positive and the cap must not undercut the base.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.base_delay_secs == 0 {
            return Err(WorkerError::config_error(
                "retry base delay must be at least 1 second",
            ));
        }
        if self.max_delay_secs < self.base_delay_secs {
            return Err(WorkerError::config_error(format!(
                "retry max delay ({}s) is below base delay ({}s)",
                self.max_delay_secs, self.base_delay_secs
            )));
        }
        Ok(())
    }
}

/// Decides whether a failed job is retried and when.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            config: RetryConfig::default(),
        }
    }
}

impl RetryStrategy {
    pub fn new(config: RetryConfig) -> WorkerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// `min(base * 2^retry_count, max)` seconds.
    pub fn calculate_retry_delay(&self, retry_count: u32) -> u64 {
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        self.config
            .base_delay_secs
            .saturating_mul(factor)
            .min(self.config.max_delay_secs)
    }

    /// Classify `failure` and decide the next step for a job that has
    /// already been retried `retry_count` times.
    pub fn decide(&self, failure: &Failure, retry_count: u32) -> RetryDecision {
        self.decide_classified(classify(failure), retry_count)
    }

    /// Decide from an existing classification.
    pub fn decide_classified(
        &self,
        classification: ErrorClassification,
        retry_count: u32,
    ) -> RetryDecision {
        if !classification.should_retry || retry_count >= self.config.max_retries {
            return RetryDecision::terminal(classification);
        }
        let delay = self.calculate_retry_delay(retry_count);
        RetryDecision::retry(classification, delay)
    }
}
