//! Structural sniffing of rendered artifacts.
//!
//! Checks the leading (and for JPEG, trailing) marker bytes against the
//! canonical format signatures plus a minimum plausible size. Nothing is
//! decoded.

use menu_export_models::{ExportType, ImageFormat, OutputValidation, ValidationResult};

use crate::limits::{ValidationLimits, DEFAULT_MIN_OUTPUT_BYTES};

/// `%PDF-`
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Start of image
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// End of image
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Validates rendered PDF/PNG/JPEG artifacts.
#[derive(Debug, Clone)]
pub struct OutputValidator {
    min_output_bytes: usize,
}

impl Default for OutputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OUTPUT_BYTES)
    }
}

impl From<&ValidationLimits> for OutputValidator {
    fn from(limits: &ValidationLimits) -> Self {
        Self::new(limits.min_output_bytes)
    }
}

impl OutputValidator {
    pub fn new(min_output_bytes: usize) -> Self {
        Self { min_output_bytes }
    }

    /// Generic size check shared by every format.
    ///
    /// Empty is an error; below the minimum is only a warning.
    pub fn validate_size(&self, bytes: &[u8]) -> OutputValidation {
        let size = bytes.len();
        if size == 0 {
            return rejected("Output buffer is empty", 0);
        }

        let mut result = ValidationResult::ok();
        if size < self.min_output_bytes {
            result = result.with_warning(format!(
                "Output size ({} bytes) is below recommended minimum ({} bytes)",
                size, self.min_output_bytes
            ));
        }
        OutputValidation::new(result, false, size)
    }

    pub fn validate_pdf(&self, bytes: &[u8]) -> OutputValidation {
        if bytes.is_empty() {
            return rejected("PDF buffer is empty", 0);
        }
        if !bytes.starts_with(PDF_SIGNATURE) {
            return rejected(
                "Invalid PDF signature: expected %PDF- header",
                bytes.len(),
            );
        }
        self.verified(bytes)
    }

    pub fn validate_png(&self, bytes: &[u8]) -> OutputValidation {
        if bytes.is_empty() {
            return rejected("PNG buffer is empty", 0);
        }
        if bytes.len() < PNG_SIGNATURE.len() {
            return rejected(
                format!(
                    "PNG buffer too small: {} bytes, signature requires {}",
                    bytes.len(),
                    PNG_SIGNATURE.len()
                ),
                bytes.len(),
            );
        }
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return rejected("Invalid PNG signature", bytes.len());
        }
        self.verified(bytes)
    }

    pub fn validate_jpeg(&self, bytes: &[u8]) -> OutputValidation {
        if bytes.is_empty() {
            return rejected("JPEG buffer is empty", 0);
        }
        if bytes.len() < JPEG_SOI.len() {
            return rejected(
                format!(
                    "JPEG buffer too small: {} bytes, SOI marker requires {}",
                    bytes.len(),
                    JPEG_SOI.len()
                ),
                bytes.len(),
            );
        }
        if !bytes.starts_with(&JPEG_SOI) {
            return rejected("Invalid JPEG signature: missing SOI marker", bytes.len());
        }

        let mut validation = self.verified(bytes);
        if !bytes.ends_with(&JPEG_EOI) {
            validation
                .result
                .warnings
                .insert(0, "JPEG EOI marker not found; file may be truncated".to_string());
        }
        validation
    }

    /// Route to the format-specific check for an export.
    ///
    /// `export_type` and `image_format` are the raw values stored on the job.
    pub fn validate_output(
        &self,
        bytes: Option<&[u8]>,
        export_type: &str,
        image_format: Option<&str>,
    ) -> OutputValidation {
        let Some(bytes) = bytes else {
            return rejected("Output buffer is missing", 0);
        };

        match ExportType::parse(export_type) {
            Some(ExportType::Pdf) => self.validate_pdf(bytes),
            Some(ExportType::Image) => match image_format {
                None => rejected(
                    "Image format must be specified for image exports",
                    bytes.len(),
                ),
                Some(format) => match ImageFormat::parse(format) {
                    Some(ImageFormat::Png) => self.validate_png(bytes),
                    Some(ImageFormat::Jpeg) => self.validate_jpeg(bytes),
                    None => rejected(
                        format!("Unsupported image format: \"{}\"", format),
                        bytes.len(),
                    ),
                },
            },
            None => rejected(
                format!("Unsupported export type: \"{}\"", export_type),
                bytes.len(),
            ),
        }
    }

    fn verified(&self, bytes: &[u8]) -> OutputValidation {
        let mut validation = self.validate_size(bytes);
        validation.format_verified = true;
        validation
    }
}

fn rejected(message: impl Into<String>, file_size: usize) -> OutputValidation {
    OutputValidation::new(ValidationResult::error(message), false, file_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(len: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(len, b' ');
        bytes
    }

    fn png(len: usize) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.resize(len, 0);
        bytes
    }

    fn jpeg(len: usize, with_eoi: bool) -> Vec<u8> {
        let mut bytes = JPEG_SOI.to_vec();
        bytes.resize(len, 0);
        if with_eoi {
            let n = bytes.len();
            bytes[n - 2..].copy_from_slice(&JPEG_EOI);
        }
        bytes
    }

    #[test]
    fn test_pdf_empty() {
        let out = OutputValidator::default().validate_pdf(&[]);
        assert!(!out.is_valid());
        assert!(out.errors()[0].contains("buffer is empty"));
        assert_eq!(out.file_size, 0);
        assert!(!out.format_verified);
    }

    #[test]
    fn test_pdf_bad_signature() {
        let out = OutputValidator::default().validate_pdf(b"<html>not a pdf</html>");
        assert!(!out.is_valid());
        assert!(out.errors()[0].contains("Invalid PDF signature"));
        assert!(!out.format_verified);
        assert_eq!(out.file_size, 22);
    }

    #[test]
    fn test_pdf_small_is_valid_with_warning() {
        let out = OutputValidator::default().validate_pdf(&pdf(20));
        assert!(out.is_valid());
        assert!(out.format_verified);
        assert_eq!(out.file_size, 20);
        assert!(out.warnings()[0].contains("below recommended minimum"));
    }

    #[test]
    fn test_pdf_normal_size_has_no_warnings() {
        let out = OutputValidator::default().validate_pdf(&pdf(4096));
        assert!(out.is_valid());
        assert!(out.warnings().is_empty());
    }

    #[test]
    fn test_png_checks() {
        let validator = OutputValidator::default();

        let tiny = validator.validate_png(&PNG_SIGNATURE[..4]);
        assert!(!tiny.is_valid());
        assert!(tiny.errors()[0].contains("buffer too small"));

        let mut wrong = png(512);
        wrong[1] = b'X';
        assert!(!validator.validate_png(&wrong).is_valid());

        let ok = validator.validate_png(&png(512));
        assert!(ok.is_valid() && ok.format_verified);
        assert!(ok.warnings().is_empty());

        let exact_signature = validator.validate_png(&PNG_SIGNATURE);
        assert!(exact_signature.is_valid());
        assert_eq!(exact_signature.warnings().len(), 1);
    }

    #[test]
    fn test_jpeg_checks() {
        let validator = OutputValidator::default();

        let one_byte = validator.validate_jpeg(&[0xFF]);
        assert!(!one_byte.is_valid());
        assert!(one_byte.errors()[0].contains("buffer too small"));

        let no_soi = validator.validate_jpeg(&[0x00, 0xD8, 0xFF, 0xD9]);
        assert!(!no_soi.is_valid());

        let complete = validator.validate_jpeg(&jpeg(1024, true));
        assert!(complete.is_valid() && complete.warnings().is_empty());

        let truncated = validator.validate_jpeg(&jpeg(1024, false));
        assert!(truncated.is_valid());
        assert!(truncated.format_verified);
        assert!(truncated.warnings()[0].contains("EOI marker not found"));
    }

    #[test]
    fn test_validate_size() {
        let validator = OutputValidator::new(100);
        assert!(!validator.validate_size(&[]).is_valid());

        let small = validator.validate_size(&[1; 99]);
        assert!(small.is_valid());
        assert_eq!(small.warnings().len(), 1);

        let enough = validator.validate_size(&[1; 100]);
        assert!(enough.is_valid() && enough.warnings().is_empty());
        assert!(!enough.format_verified);
    }

    #[test]
    fn test_validate_output_dispatch() {
        let validator = OutputValidator::default();

        assert!(validator.validate_output(Some(pdf(300).as_slice()), "pdf", None).is_valid());
        assert!(validator
            .validate_output(Some(png(300).as_slice()), "image", Some("png"))
            .is_valid());
        assert!(validator
            .validate_output(Some(jpeg(300, true).as_slice()), "image", Some("jpeg"))
            .is_valid());

        // Right bytes, wrong declared format
        assert!(!validator
            .validate_output(Some(png(300).as_slice()), "image", Some("jpeg"))
            .is_valid());
    }

    #[test]
    fn test_validate_output_rejections() {
        let validator = OutputValidator::default();

        let no_format = validator.validate_output(Some(png(300).as_slice()), "image", None);
        assert!(!no_format.is_valid());
        assert!(no_format.errors()[0].contains("must be specified"));

        let gif = validator.validate_output(Some(png(300).as_slice()), "image", Some("gif"));
        assert!(gif.errors()[0].contains("\"gif\""));

        let svg = validator.validate_output(Some(pdf(300).as_slice()), "svg", None);
        assert!(svg.errors()[0].contains("Unsupported export type"));

        let missing = validator.validate_output(None, "pdf", None);
        assert!(!missing.is_valid());
        assert!(!missing.errors().is_empty());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let validator = OutputValidator::default();
        let bytes = jpeg(128, false);
        assert_eq!(validator.validate_jpeg(&bytes), validator.validate_jpeg(&bytes));
    }
}
