//! CLI output formatting for all pipeline stages.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//!     index.html → index.html
//!     about.html → about.html
//!
//! Stylesheets
//!     assets/scss/style.scss → assets/css/style.css
//!
//! Scripts
//!     assets/js/main.js
//!
//! Images
//!     assets/images/hero.png (optimize + webp)
//!     assets/images/logo.svg (copy)
//!
//! Fonts
//!     assets/fonts/site.woff2
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 3 images (webp: supported)
//!     001 assets/images/hero.png
//!         optimized: cached
//!         webp: encoded
//! ```
//!
//! ## Generate
//!
//! ```text
//! index.html → index.html
//! assets/scss/style.scss → assets/css/style.css (+ .min.css)
//! Bundle → assets/js/app.js (2 scripts)
//! Generated 2 pages, 1 stylesheet, 1 font
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure —
//! no I/O, no side effects.

use crate::cache::CacheStats;
use crate::generate::GenerateSummary;
use crate::process::{ProcessEvent, VariantStatus};
use crate::scan::Manifest;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing the discovered source tree.
pub fn format_scan_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for page in &manifest.pages {
        lines.push(format!("    {} \u{2192} {}", page.source, page.output));
    }

    lines.push(String::new());
    lines.push("Stylesheets".to_string());
    for style in &manifest.stylesheets {
        lines.push(format!("    {} \u{2192} {}", style.source, style.output));
    }

    if !manifest.scripts.is_empty() {
        lines.push(String::new());
        lines.push("Scripts".to_string());
        for script in &manifest.scripts {
            lines.push(format!("    {}", script));
        }
    }

    if !manifest.images.is_empty() {
        lines.push(String::new());
        lines.push("Images".to_string());
        for image in &manifest.images {
            let treatment = if image.raster {
                "optimize + webp"
            } else {
                "copy"
            };
            lines.push(format!("    {} ({})", image.source, treatment));
        }
    }

    if !manifest.fonts.is_empty() {
        lines.push(String::new());
        lines.push("Fonts".to_string());
        for font in &manifest.fonts {
            lines.push(format!("    {}", font));
        }
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest) {
    for line in format_scan_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            image_count,
            webp_support,
        } => {
            let support = if *webp_support {
                "supported"
            } else {
                "unsupported"
            };
            vec![format!("Processing {} images (webp: {})", image_count, support)]
        }
        ProcessEvent::ImageProcessed {
            index,
            source,
            variants,
        } => {
            let mut lines = vec![format!("    {} {}", format_index(*index), source)];
            for variant in variants {
                let status = match variant.status {
                    VariantStatus::Cached => "cached",
                    VariantStatus::Copied => "copied",
                    VariantStatus::Encoded => "encoded",
                    VariantStatus::Written => "written",
                };
                lines.push(format!("        {}: {}", variant.label, status));
            }
            lines
        }
    }
}

/// Format the end-of-process cache summary line.
pub fn format_process_summary(stats: &CacheStats) -> String {
    format!("Images: {}", stats)
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

/// Format generate stage output showing what was written.
pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for page in &summary.pages {
        lines.push(format!("{} \u{2192} {}", page.source, page.output));
    }

    let min = if summary.minified { " (+ .min.css)" } else { "" };
    for style in &summary.stylesheets {
        lines.push(format!("{} \u{2192} {}{}", style.source, style.output, min));
    }
    if !summary.stylesheets.is_empty() && summary.webp_rewrite {
        lines.push("    webp marker rules applied".to_string());
    }

    if let Some(ref bundle) = summary.bundle {
        lines.push(format!(
            "Bundle \u{2192} {} ({} scripts)",
            bundle, summary.script_count
        ));
    }

    lines.push(format!(
        "Generated {} pages, {} stylesheets, {} fonts",
        summary.pages.len(),
        summary.stylesheets.len(),
        summary.font_count
    ));

    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
