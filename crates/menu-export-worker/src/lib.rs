//! Export job reliability layer.
//!
//! This crate provides:
//! - Failure classification into transient/resource/permanent/validation
//! - Retry decisions with exponential backoff
//! - Structured lifecycle logging and Prometheus metrics
//! - Per-service circuit state reporting
//! - A facade that applies all of the above to export jobs

pub mod circuit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod failure;
pub mod logging;
pub mod metrics;
pub mod reliability;
pub mod retry;
pub mod telemetry;

pub use circuit::{CircuitBreaker, CircuitRegistry, ServiceKind};
pub use classifier::{classify, ClassificationRule, CLASSIFICATION_RULES};
pub use config::ReliabilityConfig;
pub use error::{WorkerError, WorkerResult};
pub use failure::Failure;
pub use logging::ExportJobLogger;
pub use reliability::{ExportReliability, JobOutcome};
pub use retry::{RetryConfig, RetryStrategy};
pub use telemetry::{init_metrics, init_tracing, LogFormat};
