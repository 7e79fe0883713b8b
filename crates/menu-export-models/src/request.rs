//! Export request and format enums.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of artifact an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Pdf,
    Image,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Pdf => "pdf",
            ExportType::Image => "image",
        }
    }

    /// Parse the wire value. Matching is exact: no trimming, no case folding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pdf" => Some(ExportType::Pdf),
            "image" => Some(ExportType::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raster format for image exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "png" => Some(ImageFormat::Png),
            "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw export request as handed over by the API layer.
///
/// Fields stay as untrusted strings until the request validator has
/// admitted them; a missing field is `None` rather than an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportRequest {
    /// Requested export type (`pdf` or `image`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,

    /// Serialized menu markup to render
    #[serde(default)]
    pub html: String,

    /// Image format, required when `export_type` is `image`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,
}

impl ExportRequest {
    /// Create a PDF export request.
    pub fn pdf(html: impl Into<String>) -> Self {
        Self {
            export_type: Some(ExportType::Pdf.as_str().to_string()),
            html: html.into(),
            image_format: None,
        }
    }

    /// Create an image export request.
    pub fn image(html: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            export_type: Some(ExportType::Image.as_str().to_string()),
            html: html.into(),
            image_format: Some(format.as_str().to_string()),
        }
    }
}
