//! Pure Rust image encoder.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (best compression, adaptive filter) |
//! | Encode → WebP | `webp::Encoder` (libwebp bindings, lossy) |
//!
//! The `image` crate's `webp` feature only provides a decoder; its encoder is
//! lossless-only. The quality-controlled lossy path goes through the `webp`
//! crate instead.

use super::encoder::{AssetEncoder, Dimensions, EncoderError};
use super::params::{OptimizeParams, RasterFormat, WebpParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Pure Rust encoder using the `image` crate plus libwebp.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, EncoderError> {
    ImageReader::open(path)
        .map_err(EncoderError::Io)?
        .decode()
        .map_err(|e| {
            EncoderError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), EncoderError> {
    let file = std::fs::File::create(path).map_err(EncoderError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality as u8);
    // JPEG has no alpha channel; flatten before encoding
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| EncoderError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

fn save_png(img: &DynamicImage, path: &Path) -> Result<(), EncoderError> {
    let file = std::fs::File::create(path).map_err(EncoderError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| EncoderError::ProcessingFailed(format!("PNG encode failed: {}", e)))
}

fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), EncoderError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height());
    let encoded = encoder.encode(quality as f32);
    std::fs::write(path, &*encoded).map_err(EncoderError::Io)
}

impl AssetEncoder for RustEncoder {
    fn identify(&self, path: &Path) -> Result<Dimensions, EncoderError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            EncoderError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn optimize(&self, params: &OptimizeParams) -> Result<(), EncoderError> {
        let img = load_image(&params.source)?;
        match params.format {
            RasterFormat::Jpeg => save_jpeg(&img, &params.output, params.quality.value()),
            RasterFormat::Png => save_png(&img, &params.output),
        }
    }

    fn encode_webp(&self, params: &WebpParams) -> Result<(), EncoderError> {
        let img = load_image(&params.source)?;
        save_webp(&img, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage, RgbaImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    /// Create a small valid PNG file with an alpha channel.
    fn create_test_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let encoder = RustEncoder::new();
        let dims = encoder.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let encoder = RustEncoder::new();
        let result = encoder.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn optimize_jpeg_produces_decodable_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("optimized.jpg");
        let encoder = RustEncoder::new();
        encoder
            .optimize(&OptimizeParams {
                source,
                output: output.clone(),
                format: RasterFormat::Jpeg,
                quality: Quality::new(80),
            })
            .unwrap();

        let dims = encoder.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (400, 300));
    }

    #[test]
    fn optimize_png_preserves_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 50, 40);

        let output = tmp.path().join("optimized.png");
        let encoder = RustEncoder::new();
        encoder
            .optimize(&OptimizeParams {
                source,
                output: output.clone(),
                format: RasterFormat::Png,
                quality: Quality::new(80),
            })
            .unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!(img.color().has_alpha(), true);
        assert_eq!((img.width(), img.height()), (50, 40));
    }

    #[test]
    fn optimize_png_with_alpha_to_jpeg_flattens() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 30, 30);

        // Re-encoding a PNG source as JPEG must not fail on the alpha channel
        let output = tmp.path().join("flattened.jpg");
        let encoder = RustEncoder::new();
        encoder
            .optimize(&OptimizeParams {
                source,
                output: output.clone(),
                format: RasterFormat::Jpeg,
                quality: Quality::new(80),
            })
            .unwrap();

        assert!(output.exists());
    }

    #[test]
    fn encode_webp_from_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 200, 150);

        let output = tmp.path().join("variant.webp");
        let encoder = RustEncoder::new();
        encoder
            .encode_webp(&WebpParams {
                source,
                output: output.clone(),
                quality: Quality::new(70),
            })
            .unwrap();

        // Output is a real WebP the image crate can decode at the same size
        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }

    #[test]
    fn encode_webp_from_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 64, 48);

        let output = tmp.path().join("variant.webp");
        let encoder = RustEncoder::new();
        encoder
            .encode_webp(&WebpParams {
                source,
                output: output.clone(),
                quality: Quality::new(70),
            })
            .unwrap();

        assert!(output.exists());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn encode_webp_nonexistent_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let encoder = RustEncoder::new();
        let result = encoder.encode_webp(&WebpParams {
            source: "/nonexistent/image.png".into(),
            output: tmp.path().join("out.webp"),
            quality: Quality::new(70),
        });
        assert!(matches!(result, Err(EncoderError::Io(_))));
    }
}
