//! The encoder seam between the process stage and actual pixel work.
//!
//! [`AssetEncoder`] is the narrow interface the pipeline drives: read
//! dimensions, re-encode an original, produce a WebP variant. Production
//! code uses [`RustEncoder`](super::rust_encoder::RustEncoder); the process
//! stage tests swap in the recording mock from this module and assert on
//! the operation sequence instead of on pixels.

use super::params::{OptimizeParams, WebpParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of an image as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// The three operations the process stage needs from an encoder.
///
/// `Sync` because rayon workers share one encoder across images.
pub trait AssetEncoder: Sync {
    /// Read an image's dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, EncoderError>;

    /// Re-encode an image in its own format with pipeline settings.
    fn optimize(&self, params: &OptimizeParams) -> Result<(), EncoderError>;

    /// Encode a lossy WebP variant of an image.
    fn encode_webp(&self, params: &WebpParams) -> Result<(), EncoderError>;
}
