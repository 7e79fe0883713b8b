//! Captured failure values.
//!
//! A [`Failure`] is built once, where the render or upload error is caught,
//! and from then on travels as plain data into the classifier.

use std::error::Error as StdError;
use std::fmt;

use menu_export_models::OutputValidation;

use crate::circuit::ServiceKind;

/// Prefix of failures raised for artifacts that failed output validation.
pub const OUTPUT_VALIDATION_PREFIX: &str = "Output validation failed: ";

/// A failed render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Error text; the classifier matches on this
    pub message: String,
    /// Cause chain or stack trace, for diagnostics only
    pub trace: Option<String>,
    /// Dependency that failed, when known
    pub service: Option<ServiceKind>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
            service: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Attribute the failure to a dependency so its circuit is updated.
    pub fn with_service(mut self, service: ServiceKind) -> Self {
        self.service = Some(service);
        self
    }

    /// Capture any std error, joining its cause chain into the message.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(message).with_trace(format!("{:?}", err))
    }

    /// Capture an `anyhow` error with its full context chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self::new(format!("{:#}", err)).with_trace(format!("{:?}", err))
    }

    /// Turn a rejected artifact into a failure the classifier files under
    /// the validation category.
    pub fn from_output_validation(validation: &OutputValidation) -> Self {
        Self::new(format!(
            "{}{}",
            OUTPUT_VALIDATION_PREFIX,
            validation.errors().join("; ")
        ))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::from_anyhow(&err)
    }
}
