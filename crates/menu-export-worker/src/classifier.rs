//! Failure classification.
//!
//! Maps a captured [`Failure`] to one of four categories by scanning its
//! message against an ordered rule table. The first rule with a matching
//! token wins; a message that matches nothing is treated as transient.
//!
//! Matching is literal and case-sensitive: `ETIMEDOUT` matches, `etimedout`
//! does not.

use menu_export_models::{ErrorCategory, ErrorClassification};

use crate::failure::Failure;

/// A named group of message tokens that all map to one category.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub category: ErrorCategory,
    pub tokens: &'static [&'static str],
}

/// Rules in evaluation order.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    // Transient
    ClassificationRule {
        name: "network",
        category: ErrorCategory::Transient,
        tokens: &[
            "ECONNREFUSED",
            "ECONNRESET",
            "ETIMEDOUT",
            "ENOTFOUND",
            "EAI_AGAIN",
            "EHOSTUNREACH",
            "ENETUNREACH",
            "EPIPE",
            "socket hang up",
            "Connection refused",
            "Connection reset",
            "Connection timed out",
            "getaddrinfo",
            "Network error",
            "network error",
        ],
    },
    ClassificationRule {
        name: "database",
        category: ErrorCategory::Transient,
        tokens: &[
            "too many clients",
            "remaining connection slots are reserved",
            "Connection terminated",
            "connection pool exhausted",
            "could not obtain lock",
            "deadlock detected",
            "database is locked",
        ],
    },
    ClassificationRule {
        name: "renderer_launch",
        category: ErrorCategory::Transient,
        tokens: &[
            "Failed to launch",
            "Browser closed",
            "browser has disconnected",
            "Target closed",
            "Protocol error",
        ],
    },
    ClassificationRule {
        name: "storage_upload",
        category: ErrorCategory::Transient,
        tokens: &[
            "Upload failed",
            "upload failed",
            "SlowDown",
            "ServiceUnavailable",
            "RequestTimeTooSkewed",
        ],
    },
    ClassificationRule {
        name: "rate_limit",
        category: ErrorCategory::Transient,
        tokens: &[
            "HTTP 429",
            "status 429",
            "Too Many Requests",
            "rate limit",
            "Rate limit",
            "RateLimit",
        ],
    },
    // Resource
    ClassificationRule {
        name: "memory",
        category: ErrorCategory::Resource,
        tokens: &[
            "JavaScript heap out of memory",
            "out of memory",
            "Out of memory",
            "ENOMEM",
            "Cannot allocate memory",
        ],
    },
    ClassificationRule {
        name: "operation_timeout",
        category: ErrorCategory::Resource,
        tokens: &[
            "Navigation timeout",
            "TimeoutError",
            "Timeout exceeded",
            "operation timed out",
            "Operation timed out",
            "Render timed out",
        ],
    },
    ClassificationRule {
        name: "disk",
        category: ErrorCategory::Resource,
        tokens: &[
            "ENOSPC",
            "no space left on device",
            "No space left on device",
            "Disk quota exceeded",
        ],
    },
    ClassificationRule {
        name: "file_descriptors",
        category: ErrorCategory::Resource,
        tokens: &["EMFILE", "ENFILE", "too many open files", "Too many open files"],
    },
    // Permanent
    ClassificationRule {
        name: "not_found",
        category: ErrorCategory::Permanent,
        tokens: &["not found", "Not found", "does not exist", "HTTP 404"],
    },
    ClassificationRule {
        name: "input_rejected",
        category: ErrorCategory::Permanent,
        tokens: &[
            "exceeds maximum allowed size",
            "Payload too large",
            "payload too large",
            "Too many embedded images",
            "disallowed",
            "not allowed",
            "Not allowed",
        ],
    },
    ClassificationRule {
        name: "malformed_markup",
        category: ErrorCategory::Permanent,
        tokens: &[
            "Invalid HTML",
            "Malformed",
            "malformed",
            "Unexpected token",
            "Parse error",
            "parse error",
        ],
    },
    // Validation
    ClassificationRule {
        name: "output",
        category: ErrorCategory::Validation,
        tokens: &[
            "Output validation failed",
            "Invalid PDF signature",
            "Invalid PNG signature",
            "Invalid JPEG signature",
            "buffer is empty",
            "buffer too small",
            "Output buffer is missing",
        ],
    },
];

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: ErrorCategory = ErrorCategory::Transient;

/// Find the first rule with a token contained in `message`.
pub fn match_rule(message: &str) -> Option<&'static ClassificationRule> {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.tokens.iter().any(|token| message.contains(token)))
}

/// Category for a message, falling back to [`DEFAULT_CATEGORY`].
pub fn match_category(message: &str) -> ErrorCategory {
    match_rule(message).map_or(DEFAULT_CATEGORY, |rule| rule.category)
}

/// Classify a failure.
///
/// Total and pure: never fails, performs no I/O, and returns identical
/// results for identical input.
pub fn classify(failure: &Failure) -> ErrorClassification {
    let category = match_category(&failure.message);

    let internal_message = match &failure.trace {
        Some(trace) => format!("[{}] {}\n{}", category, failure.message, trace),
        None => format!("[{}] {}", category, failure.message),
    };

    ErrorClassification {
        category,
        should_retry: category.is_retryable(),
        user_message: category.user_message().to_string(),
        internal_message,
    }
}
