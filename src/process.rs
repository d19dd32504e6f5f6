//! Image processing and WebP variant generation.
//!
//! Stage 2 of the sitekit build pipeline. Takes the manifest from the scan
//! stage, runs the WebP support probe once, and processes every image:
//!
//! - **Raster images** (JPEG, PNG) are re-encoded with pipeline quality
//!   settings, and — when the probe succeeds and variants are enabled — a
//!   lossy WebP sibling is written next to each one.
//! - **Passthrough images** (GIF, SVG, ICO, pre-existing WebP, ...) are
//!   copied byte-for-byte. GIF goes here deliberately: re-encoding would
//!   drop animation frames.
//!
//! ## Caching
//!
//! Encodes go through the content-addressed cache in [`crate::cache`]. Each
//! variant is keyed by the source file hash plus its encoding parameters, so
//! unchanged images are skipped and moved images are copied from their old
//! output location instead of re-encoded.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel with [rayon](https://docs.rs/rayon).
//! Results are collected in manifest order, then cache updates and progress
//! events happen sequentially so output stays deterministic.

use crate::cache::{self, CacheStats, EncodeCache};
use crate::config::SiteConfig;
use crate::imaging::{
    AssetEncoder, EncoderError, OptimizeParams, Quality, RasterFormat, RustEncoder, WebpParams,
};
use crate::paths;
use crate::scan::{ImageEntry, Manifest, PageEntry, StyleEntry};
use crate::support;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image encoding failed: {0}")]
    Imaging(#[from] EncoderError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Unrecognized raster extension: {0}")]
    UnknownFormat(String),
}

/// Options for a process run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// When false, start from an empty cache manifest (`--no-cache`).
    pub use_cache: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

/// Manifest output from the process stage, consumed by generate.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedSite {
    /// Result of the build-time WebP probe. Generate keys the stylesheet
    /// rewrite and variant references off this.
    pub webp_support: bool,
    pub pages: Vec<PageEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layouts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partials: Vec<String>,
    pub stylesheets: Vec<StyleEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProcessedImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<String>,
    pub config: SiteConfig,
}

/// One image after processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub source: String,
    pub output: String,
    /// Original dimensions (width, height); raster images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
    /// Output path of the WebP variant, when one was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webp: Option<String>,
}

/// Result of a process run: the manifest for generate plus cache stats.
#[derive(Debug)]
pub struct ProcessResult {
    pub site: ProcessedSite,
    pub stats: CacheStats,
}

/// Progress event emitted per image, in manifest order.
#[derive(Debug)]
pub enum ProcessEvent {
    Started { image_count: usize, webp_support: bool },
    ImageProcessed {
        index: usize,
        source: String,
        variants: Vec<VariantInfo>,
    },
}

#[derive(Debug)]
pub struct VariantInfo {
    pub label: String,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Up to date at the expected output path.
    Cached,
    /// Recovered from the cache at a different path.
    Copied,
    /// Freshly encoded.
    Encoded,
    /// Copied through byte-for-byte (passthrough formats).
    Written,
}

pub fn process(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
    options: &ProcessOptions,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let encoder = RustEncoder::new();
    process_with_encoder(&encoder, manifest_path, source_root, output_dir, options, events)
}

/// Process images using a specific encoder (allows testing with a mock).
pub fn process_with_encoder(
    encoder: &impl AssetEncoder,
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
    options: &ProcessOptions,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let manifest_content = std::fs::read_to_string(manifest_path)?;
    let input: Manifest = serde_json::from_str(&manifest_content)?;

    std::fs::create_dir_all(output_dir)?;

    // Probe the encoder stack exactly once per run. The answer feeds variant
    // generation here and the stylesheet rewrite in the generate stage.
    let mut webp_support = false;
    support::detect_support(|supported| webp_support = supported);
    let make_variants = webp_support && input.config.images.webp;

    let cache = if options.use_cache {
        EncodeCache::open(output_dir)
    } else {
        EncodeCache::empty()
    };

    if let Some(tx) = events {
        let _ = tx.send(ProcessEvent::Started {
            image_count: input.images.len(),
            webp_support,
        });
    }

    let optimize_quality = Quality::new(input.config.images.quality);
    let webp_quality = Quality::new(input.config.images.webp_quality);

    // Parallel encode; results collected in manifest order.
    let outcomes: Vec<ImageOutcome> = input
        .images
        .par_iter()
        .map(|entry| {
            process_image(
                encoder,
                entry,
                source_root,
                output_dir,
                &cache,
                make_variants,
                optimize_quality,
                webp_quality,
            )
        })
        .collect::<Result<_, ProcessError>>()?;

    // Sequential bookkeeping: cache entries, stats, progress events.
    let mut new_cache = EncodeCache::empty();
    let mut stats = CacheStats::default();
    let mut images = Vec::with_capacity(outcomes.len());

    for (index, outcome) in outcomes.into_iter().enumerate() {
        for record in &outcome.cache_records {
            new_cache.record(
                record.output.clone(),
                record.source_hash.clone(),
                record.params_hash.clone(),
            );
            match record.status {
                VariantStatus::Cached => stats.hits += 1,
                VariantStatus::Copied => stats.copies += 1,
                VariantStatus::Encoded => stats.misses += 1,
                VariantStatus::Written => {}
            }
        }
        if let Some(tx) = events {
            let _ = tx.send(ProcessEvent::ImageProcessed {
                index: index + 1,
                source: outcome.image.source.clone(),
                variants: outcome.variants,
            });
        }
        images.push(outcome.image);
    }

    new_cache.persist(output_dir)?;

    Ok(ProcessResult {
        site: ProcessedSite {
            webp_support,
            pages: input.pages,
            layouts: input.layouts,
            partials: input.partials,
            stylesheets: input.stylesheets,
            scripts: input.scripts,
            images,
            fonts: input.fonts,
            config: input.config,
        },
        stats,
    })
}

/// Serialize the processed-site manifest into the output directory.
pub fn write_manifest(site: &ProcessedSite, output_dir: &Path) -> Result<PathBuf, ProcessError> {
    let path = output_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(site)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

struct ImageOutcome {
    image: ProcessedImage,
    variants: Vec<VariantInfo>,
    cache_records: Vec<CacheRecord>,
}

struct CacheRecord {
    output: String,
    source_hash: String,
    params_hash: String,
    status: VariantStatus,
}

#[allow(clippy::too_many_arguments)]
fn process_image(
    encoder: &impl AssetEncoder,
    entry: &ImageEntry,
    source_root: &Path,
    output_dir: &Path,
    cache: &EncodeCache,
    make_variants: bool,
    optimize_quality: Quality,
    webp_quality: Quality,
) -> Result<ImageOutcome, ProcessError> {
    let source_abs = source_root.join(&entry.source);
    if !source_abs.exists() {
        return Err(ProcessError::SourceNotFound(source_abs));
    }

    let output_abs = output_dir.join(&entry.output);
    if let Some(parent) = output_abs.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !entry.raster {
        std::fs::copy(&source_abs, &output_abs)?;
        return Ok(ImageOutcome {
            image: ProcessedImage {
                source: entry.source.clone(),
                output: entry.output.clone(),
                dimensions: None,
                webp: None,
            },
            variants: vec![VariantInfo {
                label: "original".to_string(),
                status: VariantStatus::Written,
            }],
            cache_records: Vec::new(),
        });
    }

    let ext = Path::new(&entry.source)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let format = RasterFormat::from_extension(&ext)
        .ok_or_else(|| ProcessError::UnknownFormat(entry.source.clone()))?;

    let dims = encoder.identify(&source_abs)?;
    let source_hash = cache::hash_file(&source_abs)?;

    let mut variants = Vec::new();
    let mut cache_records = Vec::new();

    // Optimized original
    let optimize_hash = cache::hash_optimize_params(format.tag(), optimize_quality.value());
    let status = run_cached(
        cache,
        output_dir,
        &entry.output,
        &source_hash,
        &optimize_hash,
        || {
            encoder.optimize(&OptimizeParams {
                source: source_abs.clone(),
                output: output_abs.clone(),
                format,
                quality: optimize_quality,
            })
        },
    )?;
    variants.push(VariantInfo {
        label: "optimized".to_string(),
        status,
    });
    cache_records.push(CacheRecord {
        output: entry.output.clone(),
        source_hash: source_hash.clone(),
        params_hash: optimize_hash,
        status,
    });

    // WebP variant
    let webp = if make_variants {
        let webp_rel = paths::webp_variant(Path::new(&entry.output))
            .to_string_lossy()
            .into_owned();
        let webp_abs = output_dir.join(&webp_rel);
        let webp_hash = cache::hash_webp_params(webp_quality.value());
        let status = run_cached(
            cache,
            output_dir,
            &webp_rel,
            &source_hash,
            &webp_hash,
            || {
                encoder.encode_webp(&WebpParams {
                    source: source_abs.clone(),
                    output: webp_abs.clone(),
                    quality: webp_quality,
                })
            },
        )?;
        variants.push(VariantInfo {
            label: "webp".to_string(),
            status,
        });
        cache_records.push(CacheRecord {
            output: webp_rel.clone(),
            source_hash: source_hash.clone(),
            params_hash: webp_hash,
            status,
        });
        Some(webp_rel)
    } else {
        None
    };

    Ok(ImageOutcome {
        image: ProcessedImage {
            source: entry.source.clone(),
            output: entry.output.clone(),
            dimensions: Some((dims.width, dims.height)),
            webp,
        },
        variants,
        cache_records,
    })
}

/// Run an encode through the cache: reuse the output in place, copy it from
/// its previous location, or fall through to `encode`.
fn run_cached(
    cache: &EncodeCache,
    output_dir: &Path,
    output_rel: &str,
    source_hash: &str,
    params_hash: &str,
    encode: impl FnOnce() -> Result<(), EncoderError>,
) -> Result<VariantStatus, ProcessError> {
    match cache.lookup(source_hash, params_hash, output_dir) {
        Some(stored) if stored == output_rel => Ok(VariantStatus::Cached),
        Some(stored) => {
            std::fs::copy(output_dir.join(&stored), output_dir.join(output_rel))?;
            Ok(VariantStatus::Copied)
        }
        None => {
            encode()?;
            Ok(VariantStatus::Encoded)
        }
    }
}
