//! Image processing for scaled responses
//!
//! Scaling is best effort: bytes that do not decode as an image are handed
//! back to the caller untouched through [`ScaleOutcome::NotAnImage`].

#[cfg(feature = "image")]
pub mod scaler;
pub mod size;

#[cfg(feature = "image")]
pub use scaler::{ImageScaler, ScaleOutcome, OUTPUT_CONTENT_TYPE};
pub use size::ScaleSize;
