//! The WebP rewrite for rendered page markup.
//!
//! The markup-side twin of the stylesheet rewrite in [`crate::styles`].
//! Stylesheets pick a variant through the marker classes; `<img>` elements
//! get the browser's own negotiation instead:
//!
//! ```html
//! <img src="assets/images/hero.png" alt="Hero">
//! ```
//!
//! becomes
//!
//! ```html
//! <picture><source srcset="assets/images/hero.webp" type="image/webp"><img src="assets/images/hero.png" alt="Hero"></picture>
//! ```
//!
//! A browser that decodes WebP fetches the `<source>`; everything else falls
//! through to the original `<img>`. Only JPEG and PNG sources are wrapped,
//! since those are the formats the process stage generates variants for, and
//! an `<img>` already inside a `<picture>` is left alone. When WebP variants
//! were not generated the markup passes through untouched.

use crate::styles::REWRITABLE;

/// Wrap every rewritable `<img>` in a `<picture>` with a WebP `<source>`.
/// Returns the input unchanged when `webp_available` is false.
pub fn rewrite_img_tags(html: &str, webp_available: bool) -> String {
    if !webp_available {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() + html.len() / 4);
    let mut rest = html;
    let mut picture_depth = 0usize;

    while let Some(lt) = rest.find('<') {
        let (before, tag_start) = rest.split_at(lt);
        out.push_str(before);
        let Some(gt) = tag_start.find('>') else {
            // truncated tag; pass the remainder through
            out.push_str(tag_start);
            return out;
        };
        let tag = &tag_start[..=gt];
        rest = &tag_start[gt + 1..];

        if tag_named(tag, "picture") {
            if tag.starts_with("</") {
                picture_depth = picture_depth.saturating_sub(1);
            } else {
                picture_depth += 1;
            }
            out.push_str(tag);
        } else if picture_depth == 0 && tag_named(tag, "img") {
            match webp_sibling(tag) {
                Some(srcset) => {
                    out.push_str("<picture><source srcset=\"");
                    out.push_str(&srcset);
                    out.push_str("\" type=\"image/webp\">");
                    out.push_str(tag);
                    out.push_str("</picture>");
                }
                None => out.push_str(tag),
            }
        } else {
            out.push_str(tag);
        }
    }
    out.push_str(rest);
    out
}

/// Whether a raw `<...>` slice is an opening or closing tag of `name`.
fn tag_named(tag: &str, name: &str) -> bool {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(inner.len());
    inner[..end].eq_ignore_ascii_case(name)
}

/// The WebP variant path for an img tag's `src`, when the source format has
/// one.
fn webp_sibling(tag: &str) -> Option<String> {
    let src = attr_value(tag, "src")?;
    let lower = src.to_lowercase();
    let ext = REWRITABLE.iter().find(|ext| lower.ends_with(*ext))?;
    Some(format!("{}.webp", &src[..src.len() - ext.len()]))
}

/// Value of an attribute inside a raw tag slice. Quoted and bare values both
/// occur in hand-written HTML.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let mut from = 0;
    loop {
        let at = from + lower[from..].find(name)?;
        from = at + name.len();

        // a real attribute sits after whitespace and before '='
        let preceded = tag[..at].ends_with(|c: char| c.is_whitespace());
        let after = tag[from..].trim_start();
        if !preceded || !after.starts_with('=') {
            continue;
        }
        let value = after[1..].trim_start();
        return match value.chars().next() {
            Some(q @ ('"' | '\'')) => value[1..].find(q).map(|end| &value[1..1 + end]),
            _ => value
                .split(|c: char| c.is_whitespace() || c == '>')
                .next()
                .filter(|v| !v.is_empty()),
        };
    }
}
