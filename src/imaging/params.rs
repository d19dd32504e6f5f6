//! Parameter types for image encode operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`process`](crate::process) stage (which decides
//! which images need work) and the [`encoder`](super::encoder) (which does
//! the actual pixel work). The separation allows swapping encoders (e.g. a
//! recording mock in tests) without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`RasterFormat`] — The two re-encoded source formats, JPEG and PNG.
//! - [`OptimizeParams`] — Full specification for an optimize: source, output, format, quality.
//! - [`WebpParams`] — Full specification for a WebP variant: source, output, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Source format of a raster image the pipeline re-encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    /// Map a lowercase file extension to a format, if it is one we re-encode.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "png" => Some(RasterFormat::Png),
            _ => None,
        }
    }

    /// Stable tag used in cache parameter hashing.
    pub fn tag(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Png => "png",
        }
    }
}

/// Parameters for re-encoding an image in its own format.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: RasterFormat,
    /// Only meaningful for JPEG; PNG is lossless and ignores it.
    pub quality: Quality,
}

/// Parameters for encoding a WebP variant of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct WebpParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn raster_format_from_extension() {
        assert_eq!(RasterFormat::from_extension("jpg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_extension("jpeg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_extension("png"), Some(RasterFormat::Png));
        assert_eq!(RasterFormat::from_extension("gif"), None);
        assert_eq!(RasterFormat::from_extension("svg"), None);
    }

    #[test]
    fn raster_format_tags_are_distinct() {
        assert_ne!(RasterFormat::Jpeg.tag(), RasterFormat::Png.tag());
    }
}
