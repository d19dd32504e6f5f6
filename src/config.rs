//! `config.toml` loading and validation.
//!
//! A site's `config.toml` is an overlay on the stock defaults, so the file
//! stays sparse — write only the values that differ:
//!
//! ```toml
//! # Only raise the WebP quality
//! [images]
//! webp_quality = 85
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! source_root = "site"      # Source tree (CLI flags override these)
//! output_root = "dist"      # Final site output
//!
//! [css]
//! output_style = "expanded" # "expanded" or "compressed"
//! minified_copies = true    # Also write a *.min.css per stylesheet
//!
//! [js]
//! bundle = "app.js"         # Name of the concatenated script bundle
//!
//! [images]
//! quality = 80              # JPEG/PNG re-encode quality (1-100)
//! webp = true               # Emit WebP variants when the encoder supports it
//! webp_quality = 70         # WebP encode quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// The full configuration surface. Every field has a working default;
/// unknown keys fail deserialization so typos surface immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the source tree (only meaningful at root level).
    pub source_root: String,
    /// Path to the final site output.
    pub output_root: String,
    /// Stylesheet compilation settings.
    pub css: CssConfig,
    /// Script bundling settings.
    pub js: JsConfig,
    /// Image optimization settings.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_root: "site".to_string(),
            output_root: "dist".to_string(),
            css: CssConfig::default(),
            js: JsConfig::default(),
            images: ImagesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Range and shape checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quality("images.quality", self.images.quality)?;
        check_quality("images.webp_quality", self.images.webp_quality)?;
        if self.js.bundle.is_empty() {
            return Err(ConfigError::Validation("js.bundle must not be empty".into()));
        }
        if Path::new(&self.js.bundle).components().count() != 1 {
            return Err(ConfigError::Validation(
                "js.bundle must be a bare filename".into(),
            ));
        }
        Ok(())
    }
}

fn check_quality(field: &str, value: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{field} must be 1-100")))
    }
}

/// Stylesheet compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    /// Output style of the primary `.css` file.
    pub output_style: CssOutputStyle,
    /// Whether to also write a compressed `*.min.css` per stylesheet.
    pub minified_copies: bool,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            output_style: CssOutputStyle::Expanded,
            minified_copies: true,
        }
    }
}

/// How the primary stylesheet output is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssOutputStyle {
    Expanded,
    Compressed,
}

impl CssOutputStyle {
    pub fn to_grass(self) -> grass::OutputStyle {
        match self {
            CssOutputStyle::Expanded => grass::OutputStyle::Expanded,
            CssOutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Script bundling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsConfig {
    /// Filename of the concatenated bundle under `assets/js/`.
    pub bundle: String,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            bundle: "app.js".to_string(),
        }
    }
}

/// Image optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG/PNG re-encode quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Whether to emit WebP variants at all. Even when enabled, variants are
    /// skipped if the build's encoder fails the support probe.
    pub webp: bool,
    /// WebP encode quality (1 = worst, 100 = best).
    pub webp_quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            webp: true,
            webp_quality: 70,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Load and validate the configuration for a source tree.
///
/// A missing `config.toml` yields the stock defaults; a present one is
/// parsed as a raw TOML value and laid over the serialized defaults before
/// deserializing, so sparse files inherit everything they don't mention.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    // Serializing the default struct is the single source of truth for the
    // base layer; it cannot fail for a plain data struct
    let defaults =
        toml::Value::try_from(SiteConfig::default()).expect("default config serializes");

    let merged = match read_user_config(root)? {
        Some(user) => overlay_value(defaults, user),
        None => defaults,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

fn read_user_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(path)?)?))
}

/// Lay `over` on top of `base`: tables merge per key, anything else from
/// `over` wins outright.
fn overlay_value(base: toml::Value, over: toml::Value) -> toml::Value {
    match (base, over) {
        (toml::Value::Table(mut merged), toml::Value::Table(over)) => {
            for (key, value) in over {
                let value = match merged.remove(&key) {
                    Some(existing) => overlay_value(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, over) => over,
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitekit Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Source tree and output locations (CLI flags override these).
source_root = "site"
output_root = "dist"

# ---------------------------------------------------------------------------
# Stylesheets
# ---------------------------------------------------------------------------
[css]
# Output style of the primary .css file: "expanded" or "compressed".
output_style = "expanded"

# Also write a compressed *.min.css next to each compiled stylesheet.
minified_copies = true

# ---------------------------------------------------------------------------
# Scripts
# ---------------------------------------------------------------------------
[js]
# Filename of the concatenated bundle written to assets/js/.
bundle = "app.js"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# JPEG/PNG re-encode quality (1 = worst, 100 = best).
quality = 80

# Emit .webp variants for JPEG/PNG sources. Variants are skipped anyway if
# the build's encoder fails the WebP support probe.
webp = true

# WebP encode quality (1 = worst, 100 = best).
webp_quality = 70

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
