//! Validation results shared by the request and output validators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of a validation check.
///
/// `errors` is non-empty iff `valid` is false. Warnings are advisory and
/// never affect `valid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A passing result with no messages.
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A failing result with a single error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![message.into()],
            warnings: Vec::new(),
        }
    }

    /// Add a warning without changing validity.
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    /// Fold another result into this one, keeping message order.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Result of validating a rendered artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputValidation {
    #[serde(flatten)]
    pub result: ValidationResult,
    /// The format signature was checked and matched
    pub format_verified: bool,
    /// Artifact size in bytes
    pub file_size: usize,
}

impl OutputValidation {
    pub fn new(result: ValidationResult, format_verified: bool, file_size: usize) -> Self {
        Self {
            result,
            format_verified,
            file_size,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.result.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.result.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.result.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_order_and_validity() {
        let mut result = ValidationResult::ok().with_warning("first");
        result.merge(ValidationResult::error("broken"));
        result.merge(ValidationResult::ok().with_warning("second"));

        assert!(!result.valid);
        assert_eq!(result.errors, vec!["broken"]);
        assert_eq!(result.warnings, vec!["first", "second"]);
    }

    #[test]
    fn test_output_validation_flattens() {
        let out = OutputValidation::new(ValidationResult::ok(), true, 1024);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["format_verified"], true);
        assert_eq!(json["file_size"], 1024);
    }
}
