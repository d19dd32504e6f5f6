//! Site generation from the processed manifest.
//!
//! Stage 3 of the sitekit build pipeline. Takes the manifest from the process
//! stage and writes the final site:
//!
//! - **Pages** are rendered through [tera](https://docs.rs/tera). Every
//!   `.html` file in the source tree (pages, layouts, partials) is loaded as
//!   a template, so pages can `{% extends "layouts/base.html" %}` and
//!   `{% include "partials/header.html" %}`. The site config is exposed to
//!   templates as `site`, the probe result as `webp_support`. Rendered pages
//!   then go through the `<img>` → `<picture>` rewrite from
//!   [`crate::markup`].
//! - **Stylesheets** are compiled with grass, run through the marker-class
//!   rewrite from [`crate::styles`], and written as `assets/css/<stem>.css`
//!   plus a compressed `.min.css` sibling.
//! - **Scripts** are concatenated into a single bundle, with the WebP
//!   bootstrap probe prepended so the marker class is set before any page
//!   script runs.
//! - **Fonts** are copied through.
//!
//! Images are already in place: the process stage writes optimized files and
//! WebP variants straight into the output directory.

use crate::config::SiteConfig;
use crate::markup;
use crate::paths;
use crate::process::ProcessedSite;
use crate::scan::{PageEntry, StyleEntry};
use crate::styles::{self, StyleError};
use crate::support;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Stylesheet error: {0}")]
    Style(#[from] StyleError),
}

/// What a generate run produced, for CLI output.
#[derive(Debug)]
pub struct GenerateSummary {
    pub pages: Vec<PageEntry>,
    pub stylesheets: Vec<StyleEntry>,
    /// Whether stylesheets carry the `.webp` / `.no-webp` rule pairs.
    pub webp_rewrite: bool,
    /// Whether `.min.css` siblings were written.
    pub minified: bool,
    /// Output path of the script bundle, when scripts exist.
    pub bundle: Option<String>,
    pub script_count: usize,
    pub font_count: usize,
}

pub fn generate(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let manifest_content = std::fs::read_to_string(manifest_path)?;
    let site: ProcessedSite = serde_json::from_str(&manifest_content)?;
    generate_site(&site, source_root, output_dir)
}

pub fn generate_site(
    site: &ProcessedSite,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    std::fs::create_dir_all(output_dir)?;

    render_pages(site, source_root, output_dir)?;
    let webp_rewrite = write_stylesheets(site, source_root, output_dir)?;
    let bundle = write_bundle(site, source_root, output_dir)?;
    copy_fonts(site, source_root, output_dir)?;

    Ok(GenerateSummary {
        pages: site.pages.clone(),
        stylesheets: site.stylesheets.clone(),
        webp_rewrite,
        minified: site.config.css.minified_copies,
        bundle,
        script_count: site.scripts.len(),
        font_count: site.fonts.len(),
    })
}

/// Load every source `.html` as a tera template, render the pages, and run
/// the rendered markup through the `<img>` → `<picture>` rewrite.
fn render_pages(
    site: &ProcessedSite,
    source_root: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let tera = load_templates(source_root)?;
    let rewrite = site.webp_support && site.config.images.webp;

    let mut context = tera::Context::new();
    context.insert("site", &site.config);
    context.insert("webp_support", &site.webp_support);

    for page in &site.pages {
        let html = tera.render(&page.source, &context)?;
        let html = markup::rewrite_img_tags(&html, rewrite);
        let out = output_dir.join(&page.output);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, html)?;
    }
    Ok(())
}

fn load_templates(source_root: &Path) -> Result<tera::Tera, GenerateError> {
    let glob = format!("{}/**/*.html", source_root.display());
    Ok(tera::Tera::new(&glob)?)
}

/// Compile, rewrite, and write every entry stylesheet. Returns whether the
/// marker-class rewrite was applied.
fn write_stylesheets(
    site: &ProcessedSite,
    source_root: &Path,
    output_dir: &Path,
) -> Result<bool, GenerateError> {
    let rewrite = site.webp_support && site.config.images.webp;

    for entry in &site.stylesheets {
        let css = styles::compile_stylesheet(source_root, &entry.source, &site.config)?;
        let css = styles::rewrite_for_webp(&css, rewrite);

        let out = output_dir.join(&entry.output);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&out, &css)?;

        if site.config.css.minified_copies {
            let min = styles::minify(&css)?;
            std::fs::write(output_dir.join(&entry.min_output), min)?;
        }
    }
    Ok(rewrite)
}

/// Concatenate script entries into the bundle, bootstrap probe first.
fn write_bundle(
    site: &ProcessedSite,
    source_root: &Path,
    output_dir: &Path,
) -> Result<Option<String>, GenerateError> {
    if site.scripts.is_empty() {
        return Ok(None);
    }

    let mut bundle = String::from(support::BOOTSTRAP_JS);
    for script in &site.scripts {
        let source = std::fs::read_to_string(source_root.join(script))?;
        bundle.push('\n');
        bundle.push_str(&source);
    }

    let rel = paths::bundle_output(&site.config.js.bundle)
        .to_string_lossy()
        .into_owned();
    let out = output_dir.join(&rel);
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, bundle)?;
    Ok(Some(rel))
}

fn copy_fonts(
    site: &ProcessedSite,
    source_root: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    for font in &site.fonts {
        let out = output_dir.join(font);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source_root.join(font), out)?;
    }
    Ok(())
}

/// Validate a source tree without writing anything: templates must parse and
/// entry stylesheets must compile.
pub fn check(source_root: &Path, config: &SiteConfig, stylesheets: &[StyleEntry]) -> Result<(), GenerateError> {
    load_templates(source_root)?;
    for entry in stylesheets {
        styles::compile_stylesheet(source_root, &entry.source, config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessedSite;
    use crate::scan;
    use crate::test_helpers::write_fixture_site;
    use std::fs;
    use tempfile::TempDir;

    /// Scan the fixture site and lift the result into a processed manifest.
    fn processed_fixture(source: &Path, webp_support: bool) -> ProcessedSite {
        let manifest = scan::scan(source).unwrap();
        ProcessedSite {
            webp_support,
            pages: manifest.pages,
            layouts: manifest.layouts,
            partials: manifest.partials,
            stylesheets: manifest.stylesheets,
            scripts: manifest.scripts,
            images: vec![],
            fonts: manifest.fonts,
            config: manifest.config,
        }
    }

    #[test]
    fn pages_render_with_layout_and_partial() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, true);
        generate_site(&site, &source, &output).unwrap();

        let index = fs::read_to_string(output.join("index.html")).unwrap();
        // Content from the page itself, the layout, and the included partial
        assert!(index.contains("<main>"));
        assert!(index.contains("Welcome"));
        assert!(index.contains("site-header"));

        let about = fs::read_to_string(output.join("about.html")).unwrap();
        assert!(about.contains("About this site"));
    }

    #[test]
    fn rendered_img_tags_gain_picture_wrappers() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);
        fs::write(
            source.join("gallery.html"),
            "<html><body><img src=\"assets/images/hero.png\" alt=\"Hero\"></body></html>",
        )
        .unwrap();

        // The scan picks gallery.html up as a page
        let site = processed_fixture(&source, true);
        generate_site(&site, &source, &output).unwrap();

        let html = fs::read_to_string(output.join("gallery.html")).unwrap();
        assert!(html.contains(
            "<picture><source srcset=\"assets/images/hero.webp\" type=\"image/webp\">"
        ));
        // The original img stays as the fallback
        assert!(html.contains("<img src=\"assets/images/hero.png\" alt=\"Hero\"></picture>"));
    }

    #[test]
    fn img_tags_untouched_without_webp_support() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);
        fs::write(
            source.join("gallery.html"),
            "<html><body><img src=\"assets/images/hero.png\"></body></html>",
        )
        .unwrap();

        let site = processed_fixture(&source, false);
        generate_site(&site, &source, &output).unwrap();

        let html = fs::read_to_string(output.join("gallery.html")).unwrap();
        assert!(!html.contains("<picture>"));
        assert!(html.contains("<img src=\"assets/images/hero.png\">"));
    }

    #[test]
    fn stylesheet_written_with_marker_rules_and_min_copy() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, true);
        let summary = generate_site(&site, &source, &output).unwrap();
        assert!(summary.webp_rewrite);

        let css = fs::read_to_string(output.join("assets/css/style.css")).unwrap();
        assert!(css.contains(".webp .hero"));
        assert!(css.contains(".no-webp .hero"));
        assert!(css.contains("hero.webp"));

        let min = fs::read_to_string(output.join("assets/css/style.min.css")).unwrap();
        assert!(min.len() < css.len());
        assert!(min.contains(".webp .hero"));
    }

    #[test]
    fn stylesheet_untouched_without_webp_support() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, false);
        let summary = generate_site(&site, &source, &output).unwrap();
        assert!(!summary.webp_rewrite);

        let css = fs::read_to_string(output.join("assets/css/style.css")).unwrap();
        assert!(!css.contains(".no-webp"));
        assert!(css.contains("hero.png"));
    }

    #[test]
    fn bundle_starts_with_bootstrap_and_keeps_script_order() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, true);
        let summary = generate_site(&site, &source, &output).unwrap();
        assert_eq!(summary.bundle.as_deref(), Some("assets/js/app.js"));

        let bundle = fs::read_to_string(output.join("assets/js/app.js")).unwrap();
        assert!(bundle.starts_with(support::BOOTSTRAP_JS));
        let main_pos = bundle.find("function initNav").unwrap();
        let menu_pos = bundle.find("function toggleMenu").unwrap();
        assert!(main_pos < menu_pos);
    }

    #[test]
    fn fonts_copied_through() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, true);
        generate_site(&site, &source, &output).unwrap();

        assert!(output.join("assets/fonts/site.woff2").exists());
    }

    #[test]
    fn generate_reads_manifest_from_disk() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);

        let site = processed_fixture(&source, true);
        let manifest_path = tmp.path().join("manifest.json");
        fs::write(&manifest_path, serde_json::to_string(&site).unwrap()).unwrap();

        let summary = generate(&manifest_path, &source, &output).unwrap();
        assert_eq!(summary.pages.len(), 2);
        assert!(output.join("index.html").exists());
    }

    #[test]
    fn broken_template_is_reported() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        write_fixture_site(&source);
        fs::write(
            source.join("broken.html"),
            "{% extends \"layouts/missing.html\" %}",
        )
        .unwrap();

        let mut site = processed_fixture(&source, true);
        site.pages.push(crate::scan::PageEntry {
            source: "broken.html".into(),
            output: "broken.html".into(),
        });

        let result = generate_site(&site, &source, &output);
        assert!(matches!(result, Err(GenerateError::Template(_))));
    }

    #[test]
    fn check_accepts_fixture_site() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        write_fixture_site(&source);
        let manifest = scan::scan(&source).unwrap();

        check(&source, &manifest.config, &manifest.stylesheets).unwrap();
        // Nothing was written
        assert!(!source.join("assets/css").exists());
    }

    #[test]
    fn check_rejects_bad_stylesheet() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        write_fixture_site(&source);
        fs::write(
            source.join("assets/scss/bad.scss"),
            ".x { color: ; }\n",
        )
        .unwrap();
        let manifest = scan::scan(&source).unwrap();

        let result = check(&source, &manifest.config, &manifest.stylesheets);
        assert!(matches!(result, Err(GenerateError::Style(_))));
    }
}
