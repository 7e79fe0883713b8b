//! Reliability layer configuration.

use std::str::FromStr;

use menu_export_validation::limits::{
    DEFAULT_MAX_EMBEDDED_IMAGES, DEFAULT_MAX_MARKUP_BYTES, DEFAULT_MIN_OUTPUT_BYTES,
};
use menu_export_validation::ValidationLimits;

use crate::circuit::DEFAULT_FAILURE_THRESHOLD;
use crate::retry::RetryConfig;

/// Reliability layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReliabilityConfig {
    /// Backoff and retry ceiling
    pub retry: RetryConfig,
    /// Request and output validation limits
    pub limits: ValidationLimits,
    /// Consecutive failures before a service circuit is reported open
    pub circuit_failure_threshold: u32,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            limits: ValidationLimits::default(),
            circuit_failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl ReliabilityConfig {
    /// Create config from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = RetryConfig::default();
        Self {
            retry: RetryConfig {
                max_retries: env_or("EXPORT_MAX_RETRIES", defaults.max_retries),
                base_delay_secs: env_or("EXPORT_RETRY_BASE_DELAY_SECS", defaults.base_delay_secs),
                max_delay_secs: env_or("EXPORT_RETRY_MAX_DELAY_SECS", defaults.max_delay_secs),
            },
            limits: ValidationLimits {
                max_markup_bytes: env_or("EXPORT_MAX_MARKUP_BYTES", DEFAULT_MAX_MARKUP_BYTES),
                max_embedded_images: env_or(
                    "EXPORT_MAX_EMBEDDED_IMAGES",
                    DEFAULT_MAX_EMBEDDED_IMAGES,
                ),
                min_output_bytes: env_or("EXPORT_MIN_OUTPUT_BYTES", DEFAULT_MIN_OUTPUT_BYTES),
                ..ValidationLimits::default()
            },
            circuit_failure_threshold: env_or(
                "EXPORT_CIRCUIT_FAILURE_THRESHOLD",
                DEFAULT_FAILURE_THRESHOLD,
            ),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
