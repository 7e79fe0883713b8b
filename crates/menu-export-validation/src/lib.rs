//! Request admission and rendered artifact validation.
//!
//! Two independent gates:
//! - [`RequestValidator`] runs before a job is enqueued (type, markup size,
//!   embedded image count)
//! - [`OutputValidator`] runs after a render (format signature, minimum size)
//!
//! Validators never fail: every outcome, including missing input, comes back
//! as a structured result with a populated error list.

pub mod limits;
pub mod output;
pub mod request;

pub use limits::ValidationLimits;
pub use output::{OutputValidator, JPEG_EOI, JPEG_SOI, PDF_SIGNATURE, PNG_SIGNATURE};
pub use request::{count_embedded_images, validate_export_type, RequestValidator};
