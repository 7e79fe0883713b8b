//! Failure categories and retry decisions.
//!
//! These values are computed per failure and never persisted as-is: the
//! worker folds them into a job transition and a log/metric emission.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category a failure is placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Operational blip (network, database connection, renderer launch, upload)
    Transient,
    /// Local resource exhaustion (memory, disk, file handles, operation timeout)
    Resource,
    /// Rooted in the request data; retrying reproduces it
    Permanent,
    /// The rendered artifact is structurally wrong
    Validation,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 4] = [
        ErrorCategory::Transient,
        ErrorCategory::Resource,
        ErrorCategory::Permanent,
        ErrorCategory::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Permanent => "permanent",
            ErrorCategory::Validation => "validation",
        }
    }

    /// Retry eligibility is a property of the category alone.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Transient | ErrorCategory::Resource)
    }

    /// Audience-safe message shown to the menu owner.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => {
                "A temporary issue interrupted your export. We will retry it automatically."
            }
            ErrorCategory::Resource => {
                "The export server is busy right now. We will retry your export shortly."
            }
            ErrorCategory::Permanent => {
                "This menu could not be exported. Please check the menu content and try again."
            }
            ErrorCategory::Validation => {
                "The generated file failed quality checks. Please try exporting again or contact support."
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict of the error classifier for one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorClassification {
    pub category: ErrorCategory,
    pub should_retry: bool,
    /// Safe to return to callers
    pub user_message: String,
    /// Full diagnostic text; logs only
    pub internal_message: String,
}

/// Outcome of the retry strategy for one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RetryDecision {
    pub should_retry: bool,
    /// Always `!should_retry`
    pub is_terminal: bool,
    /// Zero iff terminal
    pub retry_delay_seconds: u64,
    pub classification: ErrorClassification,
}

impl RetryDecision {
    /// Retry after `delay_secs`.
    pub fn retry(classification: ErrorClassification, delay_secs: u64) -> Self {
        Self {
            should_retry: true,
            is_terminal: false,
            retry_delay_seconds: delay_secs,
            classification,
        }
    }

    /// Stop retrying.
    pub fn terminal(classification: ErrorClassification) -> Self {
        Self {
            should_retry: false,
            is_terminal: true,
            retry_delay_seconds: 0,
            classification,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.classification.category
    }
}
