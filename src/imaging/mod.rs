//! Image encoding — pure Rust plus libwebp for the lossy WebP path.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Optimize → JPEG** | `image::codecs::jpeg::JpegEncoder` (quality-controlled) |
//! | **Optimize → PNG** | `image::codecs::png::PngEncoder` (best compression) |
//! | **WebP variant** | `webp::Encoder` (libwebp, lossy, quality-controlled) |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing encode operations
//! - **Encoder**: [`AssetEncoder`] trait + [`RustEncoder`]

pub mod encoder;
mod params;
pub mod rust_encoder;

pub use encoder::{AssetEncoder, EncoderError};
pub use rust_encoder::RustEncoder;
// Re-exported for tests (process.rs tests use this)
#[cfg(test)]
pub use encoder::Dimensions;
pub use params::{OptimizeParams, Quality, RasterFormat, WebpParams};
