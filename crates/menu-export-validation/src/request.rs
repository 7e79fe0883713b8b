//! Pre-flight checks on incoming export requests.
//!
//! A request that fails here never becomes a job. The `errors` list is shown
//! to the user verbatim; warnings are advisory and never block admission.

use std::sync::LazyLock;

use menu_export_models::{ExportRequest, ExportType, ImageFormat, ValidationResult};
use regex::Regex;
use tracing::debug;

use crate::limits::ValidationLimits;

/// `<img ...>` tags carrying a `src` attribute, in any attribute position.
static IMG_SRC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*?\ssrc\s*=").unwrap());

/// Check the export type.
///
/// Valid iff exactly `pdf` or `image`. No trimming or case folding.
pub fn validate_export_type(value: Option<&str>) -> ValidationResult {
    match value {
        None => ValidationResult::error("Export type is required"),
        Some(v) if ExportType::parse(v).is_some() => ValidationResult::ok(),
        Some(v) => ValidationResult::error(format!(
            "Invalid export type \"{}\". Must be one of: pdf, image",
            v
        )),
    }
}

/// Count embedded image references in the markup.
pub fn count_embedded_images(html: &str) -> usize {
    IMG_SRC_PATTERN.find_iter(html).count()
}

/// Validates export requests against configured limits.
#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    limits: ValidationLimits,
}

impl RequestValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn validate_export_type(&self, value: Option<&str>) -> ValidationResult {
        validate_export_type(value)
    }

    /// Check markup size in UTF-8 bytes.
    pub fn validate_markup(&self, html: &str) -> ValidationResult {
        if html.is_empty() {
            return ValidationResult::error("HTML content is required");
        }

        let size = html.len();
        let max = self.limits.max_markup_bytes;

        if size > max {
            return ValidationResult::error(format!(
                "HTML content size ({} bytes) exceeds maximum allowed size ({} bytes)",
                size, max
            ));
        }

        if size >= self.limits.markup_warning_bytes() {
            return ValidationResult::ok().with_warning(format!(
                "HTML content size ({} bytes) is approaching the maximum limit ({} bytes)",
                size, max
            ));
        }

        ValidationResult::ok()
    }

    /// Check the number of embedded images.
    pub fn validate_embedded_resource_count(&self, html: &str) -> ValidationResult {
        let count = count_embedded_images(html);
        let max = self.limits.max_embedded_images;

        if count > max {
            return ValidationResult::error(format!(
                "Too many embedded images ({}). Maximum allowed is {}",
                count, max
            ));
        }

        if count > 0 && count >= self.limits.image_warning_count() {
            return ValidationResult::ok().with_warning(format!(
                "Embedded image count ({}) is approaching the maximum limit ({})",
                count, max
            ));
        }

        ValidationResult::ok()
    }

    /// Check that image exports name a supported format.
    pub fn validate_image_format(&self, value: Option<&str>) -> ValidationResult {
        match value {
            None => ValidationResult::error("Image format must be specified for image exports"),
            Some(v) if ImageFormat::parse(v).is_some() => ValidationResult::ok(),
            Some(v) => ValidationResult::error(format!(
                "Unsupported image format \"{}\". Must be one of: png, jpeg",
                v
            )),
        }
    }

    /// Run every request check and merge the results in check order.
    pub fn validate_request(&self, request: &ExportRequest) -> ValidationResult {
        let export_type = request.export_type.as_deref();

        let mut result = self.validate_export_type(export_type);
        if export_type.and_then(ExportType::parse) == Some(ExportType::Image) {
            result.merge(self.validate_image_format(request.image_format.as_deref()));
        }
        result.merge(self.validate_markup(&request.html));
        result.merge(self.validate_embedded_resource_count(&request.html));

        if !result.valid {
            debug!(
                export_type = ?export_type,
                errors = result.errors.len(),
                "Export request rejected"
            );
        }

        result
    }
}
