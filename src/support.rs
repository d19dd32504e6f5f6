//! WebP format-support gate.
//!
//! The pipeline emits WebP variants of raster images plus stylesheet rules
//! keyed on a marker class pair, and leaves the final choice to whichever
//! decoder ends up rendering the site. Two decoders are involved:
//!
//! - **Build time**: the encoder stack in this binary. [`detect_support`]
//!   probes it once per build by decoding [`WEBP_SAMPLE`]; if the probe fails
//!   (e.g. the WebP feature was compiled out), the process stage skips variant
//!   generation and the stylesheet is left untouched.
//! - **Page load**: the visitor's browser. [`BOOTSTRAP_JS`] runs the same
//!   probe against the same sample bytes and adds exactly one marker class to
//!   the document root, which the rewritten CSS selects on.
//!
//! Detection is deliberately separated from application: [`decode_probe`] and
//! [`detect_support`] are pure (no document/filesystem mutation), and callers
//! map the boolean to a [`Marker`] themselves. A decode failure is not an
//! error — it *is* the "unsupported" signal, so the probe is infallible.

/// Minimal valid 2x2 lossy WebP, used purely as a capability probe.
///
/// Same bytes as the base64 payload in `static/webp-detect.js`; the build-time
/// and browser-side probes must agree on the sample or they could disagree on
/// the answer.
pub const WEBP_SAMPLE: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x3a, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, // RIFF....WEBP
    0x56, 0x50, 0x38, 0x20, 0x2e, 0x00, 0x00, 0x00, 0xb2, 0x02, 0x00, 0x9d, // VP8 chunk
    0x01, 0x2a, 0x02, 0x00, 0x02, 0x00, 0x2e, 0x69, 0x34, 0x9a, 0x4d, 0x22,
    0x22, 0x22, 0x22, 0x22, 0x00, 0x68, 0x4b, 0x28, 0x00, 0x05, 0xce, 0x96,
    0x5a, 0x00, 0x00, 0xfe, 0xf7, 0x9f, 0x7f, 0xfd, 0x0f, 0x3f, 0xc6, 0xc0,
    0xff, 0xf2, 0xf0, 0x60, 0x00, 0x00,
];

/// Client-side probe emitted at the head of the generated JS bundle.
pub const BOOTSTRAP_JS: &str = include_str!("../static/webp-detect.js");

/// Decode-test a sample. Returns `true` iff the decoder accepts it and
/// reports nonzero dimensions; every failure mode collapses to `false`.
pub fn decode_probe(sample: &[u8]) -> bool {
    match image::load_from_memory_with_format(sample, image::ImageFormat::WebP) {
        Ok(img) => img.width() > 0 && img.height() > 0,
        Err(_) => false,
    }
}

/// Probe [`WEBP_SAMPLE`] and hand the result to `observer`.
///
/// The observer is invoked exactly once, on both the decode-success and
/// decode-failure paths (`FnOnce` rules out a second invocation at the type
/// level). The result is not cached; within one process lifetime repeated
/// calls yield the same answer since decoder capability cannot change.
pub fn detect_support<F: FnOnce(bool)>(observer: F) {
    observer(decode_probe(WEBP_SAMPLE));
}

/// Mutually exclusive marker pair the stylesheet contract is keyed on.
///
/// Exactly one of the two tokens ends up on the document root once the
/// bootstrap script has run; the build-time pipeline uses the same tokens as
/// selector prefixes when rewriting `background-image` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Supported,
    Unsupported,
}

impl Marker {
    pub fn from_support(supported: bool) -> Self {
        if supported {
            Marker::Supported
        } else {
            Marker::Unsupported
        }
    }

    /// The class token as it appears in selectors and on the document root.
    pub fn token(self) -> &'static str {
        match self {
            Marker::Supported => "webp",
            Marker::Unsupported => "no-webp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // =========================================================================
    // decode_probe
    // =========================================================================

    #[test]
    fn probe_accepts_embedded_sample() {
        assert!(decode_probe(WEBP_SAMPLE));
    }

    #[test]
    fn embedded_sample_is_two_by_two() {
        let img = image::load_from_memory_with_format(WEBP_SAMPLE, image::ImageFormat::WebP)
            .expect("sample must decode");
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn probe_rejects_truncated_sample() {
        assert!(!decode_probe(&WEBP_SAMPLE[..20]));
    }

    #[test]
    fn probe_rejects_corrupt_sample() {
        let mut corrupt = WEBP_SAMPLE.to_vec();
        // Break the VP8 chunk tag
        corrupt[12] = b'X';
        assert!(!decode_probe(&corrupt));
    }

    #[test]
    fn probe_rejects_empty_input() {
        assert!(!decode_probe(&[]));
    }

    #[test]
    fn probe_rejects_non_webp_bytes() {
        // A valid PNG is still a decode failure for the WebP decoder
        let png = {
            let img = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };
        assert!(!decode_probe(&png));
    }

    // =========================================================================
    // detect_support: exactly-once observer contract
    // =========================================================================

    #[test]
    fn observer_fires_exactly_once() {
        let calls = Cell::new(0u32);
        detect_support(|_| calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn observer_receives_true_for_working_decoder() {
        let mut result = None;
        detect_support(|supported| result = Some(supported));
        assert_eq!(result, Some(true));
    }

    #[test]
    fn independent_registrations_agree() {
        // Two sequential registrations each fire once, with the same answer
        let mut first = None;
        let mut second = None;
        detect_support(|s| first = Some(s));
        detect_support(|s| second = Some(s));
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn repeated_probes_are_idempotent() {
        let a = decode_probe(WEBP_SAMPLE);
        let b = decode_probe(WEBP_SAMPLE);
        assert_eq!(a, b);
    }

    // =========================================================================
    // Marker
    // =========================================================================

    #[test]
    fn marker_tokens_are_mutually_exclusive() {
        assert_eq!(Marker::from_support(true).token(), "webp");
        assert_eq!(Marker::from_support(false).token(), "no-webp");
        assert_ne!(
            Marker::Supported.token(),
            Marker::Unsupported.token()
        );
    }

    #[test]
    fn bootstrap_script_uses_both_tokens_and_document_root() {
        assert!(BOOTSTRAP_JS.contains("'webp'"));
        assert!(BOOTSTRAP_JS.contains("'no-webp'"));
        assert!(BOOTSTRAP_JS.contains("document.documentElement"));
        // Must handle the decode-error path, not only success
        assert!(BOOTSTRAP_JS.contains("onerror"));
    }

    #[test]
    fn bootstrap_sample_matches_embedded_sample() {
        // The data: URI payload in the client script is the same bytes as
        // WEBP_SAMPLE; compare through a freshly computed base64 encoding.
        let encoded = base64_of(WEBP_SAMPLE);
        assert!(
            BOOTSTRAP_JS.contains(&encoded),
            "client probe sample diverged from WEBP_SAMPLE"
        );
    }

    /// Minimal base64 (standard alphabet, padded) for the sample comparison.
    fn base64_of(bytes: &[u8]) -> String {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
        let mut out = String::new();
        for chunk in bytes.chunks(3) {
            let b = [
                chunk[0],
                chunk.get(1).copied().unwrap_or(0),
                chunk.get(2).copied().unwrap_or(0),
            ];
            let n = u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2]);
            out.push(ALPHABET[(n >> 18 & 63) as usize] as char);
            out.push(ALPHABET[(n >> 12 & 63) as usize] as char);
            out.push(if chunk.len() > 1 {
                ALPHABET[(n >> 6 & 63) as usize] as char
            } else {
                '='
            });
            out.push(if chunk.len() > 2 {
                ALPHABET[(n & 63) as usize] as char
            } else {
                '='
            });
        }
        out
    }
}
