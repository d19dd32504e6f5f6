//! Stylesheet compilation and the WebP marker-class rewrite.
//!
//! Entry stylesheets are compiled with `grass` (a Sass implementation in
//! Rust), then run through [`rewrite_for_webp`], which turns every
//! `background-image` declaration referencing a JPEG or PNG into a pair of
//! rules keyed on the marker classes from [`support::Marker`]:
//!
//! ```css
//! .hero { background-image: url(img/hero.png); }
//! ```
//!
//! becomes
//!
//! ```css
//! .webp .hero { background-image: url(img/hero.webp); }
//! .no-webp .hero { background-image: url(img/hero.png); }
//! ```
//!
//! The bootstrap script adds exactly one of the two classes to the document
//! root at page load, so exactly one rule of each pair applies. Rules inside
//! `@media` blocks are rewritten in place; everything else passes through
//! verbatim. When WebP variants were not generated (the build-time probe
//! failed or variants are disabled), the stylesheet is returned untouched so
//! it never references files that don't exist.
//!
//! [`support::Marker`]: crate::support::Marker

use crate::config::SiteConfig;
use crate::support::Marker;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Sass compilation failed: {0}")]
    Compile(String),
}

/// Compile an entry stylesheet to CSS.
///
/// `entry` is the stylesheet path relative to the source root. The scss
/// directory is on the load path so `@use "variables"` resolves partials.
pub fn compile_stylesheet(
    source_root: &Path,
    entry: &str,
    config: &SiteConfig,
) -> Result<String, StyleError> {
    let options = grass::Options::default()
        .style(config.css.output_style.to_grass())
        .load_path(source_root.join("assets/scss"));
    grass::from_path(source_root.join(entry), &options)
        .map_err(|e| StyleError::Compile(e.to_string()))
}

/// Re-emit CSS in compressed form for the `.min.css` sibling.
///
/// CSS is a subset of SCSS, so the compiled (and rewritten) text can go back
/// through grass with the compressed output style.
pub fn minify(css: &str) -> Result<String, StyleError> {
    let options = grass::Options::default().style(grass::OutputStyle::Compressed);
    grass::from_string(css.to_string(), &options).map_err(|e| StyleError::Compile(e.to_string()))
}

/// Extensions that have WebP variants and therefore get the rewrite.
pub(crate) const REWRITABLE: &[&str] = &[".png", ".jpg", ".jpeg"];

/// Split `background-image` declarations referencing JPEG/PNG into marker
/// rule pairs. Returns the input unchanged when `webp_available` is false.
pub fn rewrite_for_webp(css: &str, webp_available: bool) -> String {
    if !webp_available {
        return css.to_string();
    }
    rewrite_block(css)
}

fn rewrite_block(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(brace) = find_significant(rest, '{') {
        let (head, after) = rest.split_at(brace);
        let body_len = match matching_brace(&after[1..]) {
            Some(len) => len,
            None => break, // unbalanced; pass the remainder through
        };
        let body = &after[1..1 + body_len];
        rest = &after[1 + body_len + 1..];

        let selector = head.trim();
        if selector.starts_with("@keyframes") {
            // Keyframe selectors (from/to/percentages) are not element
            // selectors; never rewrite inside
            out.push_str(head);
            out.push('{');
            out.push_str(body);
            out.push('}');
        } else if selector.starts_with('@') && body.contains('{') {
            // Conditional group rule (@media, @supports): rewrite contents
            out.push_str(head);
            out.push('{');
            out.push_str(&rewrite_block(body));
            out.push('}');
        } else if selector.starts_with('@') || !has_rewritable_background(body) {
            out.push_str(head);
            out.push('{');
            out.push_str(body);
            out.push('}');
        } else {
            emit_rule_pair(&mut out, head, body);
        }
    }
    out.push_str(rest);
    out
}

/// Length of the content before the `}` matching an already-consumed `{`.
///
/// Braces inside quoted strings (`content: "}"`) and comments are not
/// structure and must not pair.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' | '\'' => skip_string(&mut chars, c),
            '/' if matches!(chars.peek(), Some((_, '*'))) => skip_comment(&mut chars),
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Position of the next `target` outside quoted strings and comments.
fn find_significant(s: &str, target: char) -> Option<usize> {
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            _ if c == target => return Some(i),
            '"' | '\'' => skip_string(&mut chars, c),
            '/' if matches!(chars.peek(), Some((_, '*'))) => skip_comment(&mut chars),
            _ => {}
        }
    }
    None
}

/// Consume up to the closing quote, honoring backslash escapes.
fn skip_string(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, quote: char) {
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return,
            _ => {}
        }
    }
}

/// Consume up to and including the `*/`. The caller saw `/` and peeked `*`.
fn skip_comment(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    chars.next();
    while let Some((_, c)) = chars.next() {
        if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
            chars.next();
            return;
        }
    }
}

fn has_rewritable_background(body: &str) -> bool {
    body.split(';').any(|decl| is_rewritable_declaration(decl))
}

/// A `background` or `background-image` declaration whose url points at a
/// format the pipeline generates WebP variants for.
fn is_rewritable_declaration(decl: &str) -> bool {
    let Some((prop, value)) = decl.split_once(':') else {
        return false;
    };
    let prop = prop.trim();
    if prop != "background-image" && prop != "background" {
        return false;
    }
    value.contains("url(") && rewrite_urls(value) != value
}

/// Emit the untouched remainder of a rule plus the `.webp` / `.no-webp` pair
/// for its image declarations.
fn emit_rule_pair(out: &mut String, head: &str, body: &str) {
    let (image_decls, other_decls): (Vec<&str>, Vec<&str>) = body
        .split(';')
        .filter(|d| !d.trim().is_empty())
        .partition(|d| is_rewritable_declaration(d));

    let selector = head.trim();
    let lead = leading_whitespace(head);

    if !other_decls.is_empty() {
        out.push_str(head);
        out.push('{');
        for decl in &other_decls {
            out.push_str(decl);
            out.push(';');
        }
        out.push('}');
    }

    for (marker, rewrite) in [(Marker::Supported, true), (Marker::Unsupported, false)] {
        out.push_str(lead);
        out.push_str(&prefix_selectors(selector, marker.token()));
        out.push('{');
        for decl in &image_decls {
            let decl = decl.trim();
            if rewrite {
                out.push_str(&rewrite_urls(decl));
            } else {
                out.push_str(decl);
            }
            out.push(';');
        }
        out.push('}');
    }
}

fn leading_whitespace(head: &str) -> &str {
    let trimmed = head.trim_start_matches(|c: char| c.is_whitespace());
    &head[..head.len() - trimmed.len()]
}

/// Prefix every selector in a comma-separated list with a marker class.
fn prefix_selectors(selector: &str, token: &str) -> String {
    selector
        .split(',')
        .map(|s| format!(".{} {}", token, s.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace the extension of every rewritable `url(...)` argument with `.webp`.
fn rewrite_urls(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("url(") {
        let after = &rest[start + 4..];
        let Some(end) = after.find(')') else {
            break;
        };
        out.push_str(&rest[..start + 4]);
        out.push_str(&rewrite_url_argument(&after[..end]));
        out.push(')');
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn rewrite_url_argument(arg: &str) -> String {
    let trimmed = arg.trim();
    let (quote, path) = match trimmed.chars().next() {
        Some(q @ ('"' | '\'')) => (Some(q), trimmed.trim_matches(q)),
        _ => (None, trimmed),
    };
    let lower = path.to_lowercase();
    for ext in REWRITABLE {
        if lower.ends_with(ext) {
            let stem = &path[..path.len() - ext.len()];
            let rewritten = format!("{stem}.webp");
            return match quote {
                Some(q) => format!("{q}{rewritten}{q}"),
                None => rewritten,
            };
        }
    }
    arg.to_string()
}
