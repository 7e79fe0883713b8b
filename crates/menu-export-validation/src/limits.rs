//! Size and count ceilings applied by the validators.

/// 5 MiB
pub const DEFAULT_MAX_MARKUP_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_MAX_EMBEDDED_IMAGES: usize = 100;

pub const DEFAULT_MIN_OUTPUT_BYTES: usize = 256;

/// Share of a ceiling at which a warning is raised.
pub const DEFAULT_WARNING_PERCENT: usize = 80;

/// Validation limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum UTF-8 byte length of the markup payload
    pub max_markup_bytes: usize,
    /// Maximum number of `<img>` references in the markup
    pub max_embedded_images: usize,
    /// Rendered artifacts below this size get a warning
    pub min_output_bytes: usize,
    /// Percentage of a ceiling at which a warning is raised
    pub warning_percent: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_markup_bytes: DEFAULT_MAX_MARKUP_BYTES,
            max_embedded_images: DEFAULT_MAX_EMBEDDED_IMAGES,
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            warning_percent: DEFAULT_WARNING_PERCENT,
        }
    }
}

impl ValidationLimits {
    /// Markup size at which the "approaching" warning starts.
    pub fn markup_warning_bytes(&self) -> usize {
        warning_threshold(self.max_markup_bytes, self.warning_percent)
    }

    /// Image count at which the "approaching" warning starts.
    pub fn image_warning_count(&self) -> usize {
        warning_threshold(self.max_embedded_images, self.warning_percent)
    }
}

fn warning_threshold(ceiling: usize, percent: usize) -> usize {
    ceiling.saturating_mul(percent) / 100
}
