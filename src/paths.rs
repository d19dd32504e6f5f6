//! Source-tree layout and source→output path mapping.
//!
//! The pipeline expects a fixed directory convention:
//!
//! ```text
//! site/                            # Source root
//! ├── config.toml                  # Site configuration (optional)
//! ├── index.html                   # Pages (top-level .html, rendered via tera)
//! ├── layouts/base.html            # Layout templates pages extend
//! ├── partials/header.html         # Fragments pages include
//! └── assets/
//!     ├── scss/style.scss          # Entry stylesheets (_*.scss = partials)
//!     ├── js/app.js                # Script entries, concatenated in order
//!     ├── images/**                # Optimized; JPEG/PNG gain .webp variants
//!     └── fonts/*                  # Copied through
//! ```
//!
//! Output lands under matching `assets/` subtrees:
//!
//! ```text
//! dist/
//! ├── index.html
//! └── assets/
//!     ├── css/style.css  style.min.css
//!     ├── js/app.js                # Bundle (webp bootstrap + entries)
//!     ├── images/**                # Originals + .webp variants
//!     └── fonts/*
//! ```
//!
//! [`classify`] decides what each source file is; the `*_output` helpers
//! decide where its product goes. Both work on paths relative to the source
//! root so manifests stay portable.

use std::path::{Path, PathBuf};

/// Output subdirectory for compiled stylesheets.
pub const CSS_DIR: &str = "assets/css";
/// Output subdirectory for the script bundle.
pub const JS_DIR: &str = "assets/js";

/// Image extensions that are re-encoded and gain WebP variants.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Image extensions copied through untouched (vectors, icons, metadata files
/// that ride along in the images tree, and pre-existing WebP).
pub const PASSTHROUGH_EXTENSIONS: &[&str] =
    &["gif", "svg", "ico", "webp", "webmanifest", "xml", "json"];

/// Font extensions copied through.
pub const FONT_EXTENSIONS: &[&str] = &["eot", "otf", "woff", "woff2", "ttf"];

/// What a source file is, decided purely from its path relative to the
/// source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Top-level `.html` file: rendered through tera into the output root.
    Page,
    /// `layouts/**.html`: template pages extend; not emitted itself.
    Layout,
    /// `partials/**.html`: template fragment; not emitted itself.
    Partial,
    /// `assets/scss/*.scss` without a leading underscore: compiled to CSS.
    Style,
    /// `assets/scss/` file with a leading underscore: pulled in via `@use`.
    StylePartial,
    /// `assets/js/*.js`: concatenated into the bundle.
    Script,
    /// `assets/images/**` JPEG/PNG: optimized + WebP variant.
    RasterImage,
    /// `assets/images/**` everything else recognized: copied through.
    PassthroughImage,
    /// `assets/fonts/*`: copied through.
    Font,
    /// Anything the pipeline doesn't handle (config.toml, dotfiles, ...).
    Other,
}

/// Classify a file by its path relative to the source root.
pub fn classify(rel: &Path) -> AssetKind {
    let ext = extension_lowercase(rel);
    let mut components = rel.components().filter_map(|c| c.as_os_str().to_str());
    let first = components.next().unwrap_or_default();
    let second = components.next().unwrap_or_default();

    match first {
        "layouts" if ext == "html" => AssetKind::Layout,
        "partials" if ext == "html" => AssetKind::Partial,
        "assets" => match second {
            "scss" if ext == "scss" => {
                let stem = rel
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                if stem.starts_with('_') {
                    AssetKind::StylePartial
                } else {
                    AssetKind::Style
                }
            }
            "js" if ext == "js" => AssetKind::Script,
            "images" => {
                if RASTER_EXTENSIONS.contains(&ext.as_str()) {
                    AssetKind::RasterImage
                } else if PASSTHROUGH_EXTENSIONS.contains(&ext.as_str()) {
                    AssetKind::PassthroughImage
                } else {
                    AssetKind::Other
                }
            }
            "fonts" if FONT_EXTENSIONS.contains(&ext.as_str()) => AssetKind::Font,
            _ => AssetKind::Other,
        },
        // Pages live at the top level only; nested .html outside layouts/
        // partials is not rendered.
        _ if ext == "html" && rel.components().count() == 1 => AssetKind::Page,
        _ => AssetKind::Other,
    }
}

fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Output path for a page: same name, output root.
pub fn page_output(rel: &Path) -> PathBuf {
    PathBuf::from(rel.file_name().unwrap_or_default())
}

/// Output path for a compiled stylesheet: `assets/css/<stem>.css`.
pub fn style_output(rel: &Path) -> PathBuf {
    let stem = rel
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Path::new(CSS_DIR).join(format!("{stem}.css"))
}

/// Minified sibling of a compiled stylesheet: `assets/css/<stem>.min.css`.
pub fn style_min_output(rel: &Path) -> PathBuf {
    let stem = rel
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Path::new(CSS_DIR).join(format!("{stem}.min.css"))
}

/// Output path for an image: the source path unchanged (`assets/images/...`
/// mirrors through).
pub fn image_output(rel: &Path) -> PathBuf {
    rel.to_path_buf()
}

/// Sibling WebP variant path for a raster image.
pub fn webp_variant(output: &Path) -> PathBuf {
    output.with_extension("webp")
}

/// Output path for the script bundle, given the configured bundle name.
pub fn bundle_output(bundle: &str) -> PathBuf {
    Path::new(JS_DIR).join(bundle)
}
