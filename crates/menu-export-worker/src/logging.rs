//! Structured job lifecycle logging.
//!
//! Every lifecycle event (claimed, started, completed, failed, retrying,
//! terminal failure) is emitted with the job ID and export type as fields.
//! Failure events log the internal message; the user message is only ever
//! stored on the job.

use std::time::Duration;

use menu_export_models::{ErrorClassification, ExportJob, RetryDecision};
use tracing::{error, info, warn, Span};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ExportJobLogger {
    job_id: String,
    export_type: &'static str,
}

impl ExportJobLogger {
    pub fn new(job: &ExportJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            export_type: job.export_type.as_str(),
        }
    }

    pub fn claimed(&self, worker_id: &str, retry_count: u32) {
        info!(
            job_id = %self.job_id,
            export_type = self.export_type,
            worker_id = %worker_id,
            retry_count,
            "Export job claimed"
        );
    }

    pub fn started(&self, attempt: u32) {
        info!(
            job_id = %self.job_id,
            export_type = self.export_type,
            attempt,
            "Export render started"
        );
    }

    pub fn completed(&self, file_size: usize, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            export_type = self.export_type,
            file_size,
            elapsed_ms = elapsed.as_millis() as u64,
            "Export job completed"
        );
    }

    pub fn validation_warning(&self, warning: &str) {
        warn!(
            job_id = %self.job_id,
            export_type = self.export_type,
            "Export output warning: {}", warning
        );
    }

    pub fn failed(&self, classification: &ErrorClassification, retry_count: u32, elapsed: Duration) {
        warn!(
            job_id = %self.job_id,
            export_type = self.export_type,
            category = %classification.category,
            retryable = classification.should_retry,
            retry_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Export attempt failed: {}", classification.internal_message
        );
    }

    pub fn retrying(&self, decision: &RetryDecision, next_retry_count: u32) {
        info!(
            job_id = %self.job_id,
            export_type = self.export_type,
            category = %decision.category(),
            retry_count = next_retry_count,
            delay_secs = decision.retry_delay_seconds,
            "Export job scheduled for retry"
        );
    }

    pub fn terminal_failure(&self, decision: &RetryDecision, retry_count: u32) {
        error!(
            job_id = %self.job_id,
            export_type = self.export_type,
            category = %decision.category(),
            retry_count,
            "Export job failed permanently: {}", decision.classification.internal_message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "export_job",
            job_id = %self.job_id,
            export_type = self.export_type
        )
    }
}
