//! Filesystem scanning and manifest generation.
//!
//! Stage 1 of the sitekit build pipeline. Walks the source tree, classifies
//! every file via [`paths::classify`], and produces a structured manifest
//! that the process and generate stages consume.
//!
//! ## Output
//!
//! Produces a [`Manifest`] containing:
//! - Pages (top-level `.html`, rendered through tera)
//! - Layouts and partials (template inputs, never emitted directly)
//! - Entry stylesheets with their compiled output paths
//! - Script entries in bundle order
//! - Images split into raster (optimized + WebP variant) and passthrough
//! - Fonts
//! - Site configuration
//!
//! ## Validation
//!
//! The scanner enforces these rules:
//! - The source root must exist and contain at least one page
//! - Two entry stylesheets may not compile to the same output file
//!   (`a.scss` and `a.sass` would both produce `assets/css/a.css`)

use crate::config::{self, SiteConfig};
use crate::paths::{self, AssetKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("No pages found in {0} (expected top-level .html files)")]
    NoPages(PathBuf),
    #[error("Stylesheets {0} and {1} both compile to {2}")]
    DuplicateStyleOutput(String, String, String),
}

/// Manifest output from the scan stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub pages: Vec<PageEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layouts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partials: Vec<String>,
    pub stylesheets: Vec<StyleEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<String>,
    pub config: SiteConfig,
}

/// A page to render: source template name and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    /// Path relative to the source root; doubles as the tera template name.
    pub source: String,
    /// Path relative to the output root.
    pub output: String,
}

/// An entry stylesheet and where its compiled CSS goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleEntry {
    pub source: String,
    /// Compiled output, e.g. `assets/css/style.css`.
    pub output: String,
    /// Compressed sibling, e.g. `assets/css/style.min.css`.
    pub min_output: String,
}

/// An image in the source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    pub source: String,
    pub output: String,
    /// Raster images are re-encoded and gain WebP variants; everything else
    /// is copied through byte-for-byte.
    pub raster: bool,
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::SourceNotFound(root.to_path_buf()));
    }

    let site_config = config::load_config(root)?;

    let mut pages = Vec::new();
    let mut layouts = Vec::new();
    let mut partials = Vec::new();
    let mut stylesheets = Vec::new();
    let mut scripts = Vec::new();
    let mut images = Vec::new();
    let mut fonts = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .expect("walkdir yields paths under root");
        let rel_str = rel.to_string_lossy().replace('\\', "/");

        match paths::classify(rel) {
            AssetKind::Page => pages.push(PageEntry {
                source: rel_str,
                output: paths::page_output(rel).to_string_lossy().into_owned(),
            }),
            AssetKind::Layout => layouts.push(rel_str),
            AssetKind::Partial => partials.push(rel_str),
            AssetKind::Style => stylesheets.push(StyleEntry {
                source: rel_str,
                output: paths::style_output(rel).to_string_lossy().into_owned(),
                min_output: paths::style_min_output(rel).to_string_lossy().into_owned(),
            }),
            AssetKind::StylePartial => {
                // Pulled in by grass through @use/@import; not an entry point
            }
            AssetKind::Script => scripts.push(rel_str),
            AssetKind::RasterImage => images.push(ImageEntry {
                source: rel_str,
                output: paths::image_output(rel).to_string_lossy().into_owned(),
                raster: true,
            }),
            AssetKind::PassthroughImage => images.push(ImageEntry {
                source: rel_str,
                output: paths::image_output(rel).to_string_lossy().into_owned(),
                raster: false,
            }),
            AssetKind::Font => fonts.push(rel_str),
            AssetKind::Other => {}
        }
    }

    if pages.is_empty() {
        return Err(ScanError::NoPages(root.to_path_buf()));
    }

    check_style_collisions(&stylesheets)?;

    Ok(Manifest {
        pages,
        layouts,
        partials,
        stylesheets,
        scripts,
        images,
        fonts,
        config: site_config,
    })
}

fn check_style_collisions(stylesheets: &[StyleEntry]) -> Result<(), ScanError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for entry in stylesheets {
        if let Some(prev) = seen.insert(entry.output.as_str(), entry.source.as_str()) {
            return Err(ScanError::DuplicateStyleOutput(
                prev.to_string(),
                entry.source.clone(),
                entry.output.clone(),
            ));
        }
    }
    Ok(())
}
