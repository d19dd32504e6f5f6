//! # sitekit
//!
//! A single-binary asset pipeline for hand-written static sites. Your
//! filesystem is the data source: top-level HTML files are pages, SCSS
//! compiles to CSS, scripts concatenate into one bundle, and images are
//! optimized with WebP variants generated alongside.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! sitekit processes a site through three independent stages, each producing
//! a JSON manifest that the next stage consumes:
//!
//! ```text
//! 1. Scan      site/     →  manifest.json    (filesystem → structured data)
//! 2. Process   manifest  →  dist/assets/     (optimized images + WebP variants)
//! 3. Generate  manifest  →  dist/            (pages, CSS, JS bundle, fonts)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Debuggability**: each manifest is human-readable JSON you can inspect.
//! - **Incremental builds**: the process stage skips images whose content and
//!   encoding parameters haven't changed.
//! - **Testability**: each stage is a function from manifest to manifest, so
//!   unit tests can exercise pipeline logic with a mock encoder and no real
//!   image work.
//!
//! # The WebP Gate
//!
//! Browsers that cannot decode WebP must never be served it, and browsers
//! that can should never download the larger original. sitekit resolves this
//! with the same probe on both sides of the wire:
//!
//! - At build time, [`support::detect_support`] decodes a 2x2 embedded WebP
//!   sample through the encoder stack. Success enables variant generation and
//!   the stylesheet rewrite; failure degrades the build to originals only.
//! - At page load, the bundled bootstrap script ([`support::BOOTSTRAP_JS`])
//!   decodes the identical sample in the visitor's browser and adds `webp` or
//!   `no-webp` to the document root. The rewritten CSS selects on those
//!   classes, so each visitor downloads exactly one variant per image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1 — walks the source tree, classifies assets, produces the scan manifest |
//! | [`process`] | Stage 2 — optimizes raster images and generates WebP variants, cached |
//! | [`generate`] | Stage 3 — renders pages via tera, compiles SCSS, writes the JS bundle |
//! | [`support`] | The WebP format-support gate: embedded sample, probe, marker classes |
//! | [`paths`] | Source-tree conventions and source→output path mapping |
//! | [`styles`] | grass compilation and the `.webp`/`.no-webp` stylesheet rewrite |
//! | [`markup`] | `<img>` → `<picture>` rewrite in rendered pages |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`cache`] | Content-addressed encode cache for incremental builds |
//! | [`imaging`] | Encoder seam: `image` crate for JPEG/PNG, libwebp for WebP |
//! | [`output`] | CLI output formatting for pipeline results |
//!
//! # Design Decisions
//!
//! ## Tera Over a Custom Templating Layer
//!
//! Pages are plain HTML with [tera](https://docs.rs/tera) inheritance:
//! `{% extends %}` for layouts, `{% include %}` for partials. Authors who
//! know HTML can read every template; there is no component model to learn.
//!
//! ## Pure-Rust Toolchain, One Exception
//!
//! SCSS compilation (grass), image decoding and JPEG/PNG encoding (image),
//! and hashing (sha2) are pure Rust. The one linked C library is libwebp via
//! the `webp` crate, because the `image` crate's WebP encoder is
//! lossless-only and the pipeline needs quality-controlled lossy output.
//!
//! ## GIF Is Copied, Never Re-encoded
//!
//! Re-encoding an animated GIF frame-by-frame risks dropping frames and
//! timing. GIFs are classified as passthrough and copied byte-for-byte.

pub mod cache;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod markup;
pub mod output;
pub mod paths;
pub mod process;
pub mod scan;
pub mod styles;
pub mod support;

#[cfg(test)]
pub(crate) mod test_helpers;
