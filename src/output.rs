//! CLI output formatting for resolved metadata.
//!
//! # Information-First Display
//!
//! Output leads with what a link preview would show (the property and its
//! value), with list values expanded as indented lines underneath. Empty
//! properties are listed too, marked `(empty)`, so it is obvious which keys
//! resolved to nothing rather than being missing.
//!
//! # Output Format
//!
//! ## Show
//!
//! ```text
//! post:12 (15 properties, 2 images)
//!     og:title: Hello
//!     og:type: article
//!     og:image (2)
//!         https://example.org/wp-content/uploads/a.jpg
//!         https://example.org/wp-content/uploads/b.jpg
//!     og:audio (empty)
//!     article:tag (2)
//!         beach
//!         summer
//! ```
//!
//! ## Prefix
//!
//! ```text
//! og       http://ogp.me/ns#
//! article  http://ogp.me/ns/article#
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::context::PageContext;
use crate::registry::OG_IMAGE;
use crate::types::{MetaValue, Metadata, Prefixes};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line: page address with property and image counts.
///
/// ```text
/// post:12 (15 properties, 2 images)
/// home (13 properties, 1 image)
/// ```
fn page_header(page: PageContext, metadata: &Metadata) -> String {
    let images = metadata
        .get(OG_IMAGE)
        .map(|v| v.values().iter().filter(|s| !s.is_empty()).count())
        .unwrap_or(0);
    let noun = if images == 1 { "image" } else { "images" };
    format!(
        "{} ({} properties, {} {})",
        page,
        metadata.len(),
        images,
        noun
    )
}

/// Format one property as one or more lines at `depth`.
fn property_lines(key: &str, value: &MetaValue, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    if value.is_empty() {
        return vec![format!("{pad}{key} (empty)")];
    }
    match value {
        MetaValue::Text(text) => vec![format!("{pad}{key}: {text}")],
        MetaValue::List(items) => {
            let mut lines = vec![format!("{pad}{key} ({})", items.len())];
            let item_pad = indent(depth + 1);
            lines.extend(items.iter().map(|item| format!("{item_pad}{item}")));
            lines
        }
    }
}

/// Format resolved metadata for a page.
pub fn format_metadata(page: PageContext, metadata: &Metadata) -> Vec<String> {
    let mut lines = vec![page_header(page, metadata)];
    for (key, value) in metadata.iter() {
        lines.extend(property_lines(key, value, 1));
    }
    lines
}

/// Print resolved metadata to stdout.
pub fn print_metadata(page: PageContext, metadata: &Metadata) {
    for line in format_metadata(page, metadata) {
        println!("{}", line);
    }
}

/// Format namespace declarations as an aligned two-column table.
pub fn format_prefixes(prefixes: &Prefixes) -> Vec<String> {
    let width = prefixes.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
    prefixes
        .iter()
        .map(|(prefix, uri)| format!("{:<width$}  {}", prefix, uri, width = width))
        .collect()
}

/// Print namespace declarations to stdout.
pub fn print_prefixes(prefixes: &Prefixes) {
    for line in format_prefixes(prefixes) {
        println!("{}", line);
    }
}
