//! Encode cache for incremental builds.
//!
//! Optimizing a raster image and encoding its WebP variant are the only
//! expensive steps in the pipeline, so they are the only cached ones. Scans,
//! stylesheet compilation, and template rendering always run; their inputs
//! change independently of the images and they are cheap enough not to
//! matter.
//!
//! A cached output is keyed by two SHA-256 digests:
//!
//! - `source_hash` over the source file bytes. Hashing content instead of
//!   mtimes keeps the cache valid across `git checkout`, which rewrites
//!   timestamps. One digest per source file, shared by the optimized output
//!   and the WebP variant.
//! - `params_hash` over the encoding parameters (format and quality for
//!   optimize, quality for WebP), each under a distinct namespace so the two
//!   operations can never alias.
//!
//! Lookups go through a reverse index from `(source_hash, params_hash)` to
//! the output path recorded last build, so a hit does not require the image
//! to still live at the same source path. [`EncodeCache::lookup`] returns
//! the recorded path only while the file is actually on disk; when the image
//! moved, the process stage copies the old output into place instead of
//! re-encoding.
//!
//! The cache file is `.cache-manifest.json` inside the output directory. It
//! rides along when `dist/` is cached in CI. `--no-cache` skips loading it,
//! which re-encodes everything.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Bumping this orphans every existing cache file. Do it whenever the key
/// computation or the JSON layout changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// Persistent record of which outputs were built from which inputs.
///
/// Serialized as `{version, entries: {output_path: {source_hash,
/// params_hash}}}`; the reverse index is rebuilt on load.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EncodeCache {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl EncodeCache {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Load the cache stored in `output_dir`. A missing, unreadable, or
    /// wrong-version file is not an error, just an empty cache.
    pub fn open(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(output_dir.join(MANIFEST_FILENAME)) else {
            return Self::empty();
        };
        let Ok(mut cache) = serde_json::from_str::<Self>(&content) else {
            return Self::empty();
        };
        if cache.version != MANIFEST_VERSION {
            return Self::empty();
        }
        cache.by_content = cache
            .entries
            .iter()
            .map(|(path, e)| (content_key(&e.source_hash, &e.params_hash), path.clone()))
            .collect();
        cache
    }

    pub fn persist(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_dir.join(MANIFEST_FILENAME), json)
    }

    /// Find a previously built output for this content and these parameters.
    ///
    /// Returns the output path recorded last build, which may differ from
    /// where the caller wants the file now; the caller copies in that case.
    /// An entry whose file vanished from `output_dir` counts as a miss.
    pub fn lookup(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let stored = self.by_content.get(&content_key(source_hash, params_hash))?;
        output_dir.join(stored).exists().then(|| stored.clone())
    }

    /// Record an output file. When the same content was previously recorded
    /// under a different path the stale entry is dropped, so moved images
    /// don't accumulate dead entries.
    pub fn record(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);
        if let Some(old_path) = self.by_content.get(&key) {
            if *old_path != output_path {
                let old_path = old_path.clone();
                self.entries.remove(&old_path);
            }
        }
        self.by_content.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 of a file's contents as lowercase hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Parameter digest for an optimized original: operation namespace, source
/// format, quality.
pub fn hash_optimize_params(format_tag: &str, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"optimize\0");
    hasher.update(format_tag.as_bytes());
    hasher.update(b"\0");
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parameter digest for a WebP variant.
pub fn hash_webp_params(quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"webp\0");
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Per-run tally of how each encode was satisfied.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Output already in place from a previous build.
    pub hits: u32,
    /// Recovered by copying a previous build's output from another path.
    pub copies: u32,
    /// Actually encoded.
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} encoded", self.misses);
        }
        write!(f, "{} cached, ", self.hits)?;
        if self.copies > 0 {
            write!(f, "{} copied, ", self.copies)?;
        }
        write!(f, "{} encoded ({} total)", self.misses, self.total())
    }
}
