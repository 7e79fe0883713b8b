//! Shared data models for the menu export pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Export jobs and their status state machine
//! - Export requests as received from the API layer
//! - Failure classifications and retry decisions
//! - Validation results for requests and rendered artifacts

pub mod classification;
pub mod job;
pub mod request;
pub mod validation;

// Re-export common types
pub use classification::{ErrorCategory, ErrorClassification, RetryDecision};
pub use job::{ExportJob, JobId, JobStatus, TransitionError, MAX_ERROR_MESSAGE_CHARS};
pub use request::{ExportRequest, ExportType, ImageFormat};
pub use validation::{OutputValidation, ValidationResult};
