//! Export job record and its status transitions.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{ExportType, ImageFormat};

/// Longest error message stored on a job row.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 2000;

/// Unique identifier for an export job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Export job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker
    #[default]
    Pending,
    /// Claimed and being rendered
    Processing,
    /// Artifact rendered and validated
    Completed,
    /// Terminal failure, no further attempts
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job transition for {job_id}: cannot {action} a job that is {from}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub action: &'static str,
}

/// The subset of an export job row the reliability layer reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportJob {
    /// Unique job ID
    pub id: JobId,

    /// Export type
    pub export_type: ExportType,

    /// Image format (image exports only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<ImageFormat>,

    /// Menu markup to render
    pub html_payload: String,

    /// Queue priority, opaque to this layer
    #[serde(default)]
    pub priority: i32,

    /// Number of retry decisions taken so far
    #[serde(default)]
    pub retry_count: u32,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Worker holding the claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,

    /// When the claim was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,

    /// Earliest time the job may be claimed again after a retry decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,

    /// User-facing error message of the last failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Create a pending PDF export job.
    pub fn new_pdf(html_payload: impl Into<String>) -> Self {
        Self::new(ExportType::Pdf, None, html_payload)
    }

    /// Create a pending image export job.
    pub fn new_image(html_payload: impl Into<String>, format: ImageFormat) -> Self {
        Self::new(ExportType::Image, Some(format), html_payload)
    }

    fn new(
        export_type: ExportType,
        image_format: Option<ImageFormat>,
        html_payload: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            export_type,
            image_format,
            html_payload: html_payload.into(),
            priority: 0,
            retry_count: 0,
            status: JobStatus::Pending,
            claimed_by: None,
            claimed_at: None,
            next_attempt_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set queue priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether a pending job may be claimed at `now`.
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && self.next_attempt_at.map_or(true, |at| at <= now)
    }

    /// pending -> processing.
    pub fn claim(&mut self, worker_id: impl Into<String>) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Pending, "claim")?;
        let now = Utc::now();
        self.status = JobStatus::Processing;
        self.claimed_by = Some(worker_id.into());
        self.claimed_at = Some(now);
        self.next_attempt_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// processing -> completed.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "complete")?;
        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.error_message = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// processing -> pending with the retry counter bumped.
    ///
    /// The job becomes claimable again once `delay_secs` have elapsed.
    pub fn schedule_retry(
        &mut self,
        delay_secs: u64,
        error: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "retry")?;
        let now = Utc::now();
        let delay = Duration::try_seconds(i64::try_from(delay_secs).unwrap_or(i64::MAX))
            .unwrap_or(Duration::MAX);
        self.status = JobStatus::Pending;
        self.retry_count = self.retry_count.saturating_add(1);
        self.claimed_by = None;
        self.claimed_at = None;
        self.next_attempt_at = Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
        self.error_message = Some(truncate_error(error.into()));
        self.updated_at = now;
        Ok(())
    }

    /// processing -> failed.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "fail")?;
        let now = Utc::now();
        self.status = JobStatus::Failed;
        self.error_message = Some(truncate_error(error.into()));
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn expect_status(&self, expected: JobStatus, action: &'static str) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError {
                job_id: self.id.clone(),
                from: self.status,
                action,
            })
        }
    }
}

fn truncate_error(mut message: String) -> String {
    if let Some((idx, _)) = message.char_indices().nth(MAX_ERROR_MESSAGE_CHARS) {
        message.truncate(idx);
    }
    message
}
