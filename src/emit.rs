//! Markup emission: `<meta>` tags for the document head and the `prefix`
//! attribute for the `<html>` element.
//!
//! Consumers disagree on attribute naming. Open Graph is RDFa and wants
//! `property=`; card and identity consumers read `name=`. The default
//! (loose) mode writes both on every tag:
//!
//! ```html
//! <meta property="og:title" name="og:title" content="Hello">
//! <meta property="twitter:card" name="twitter:card" content="summary">
//! ```
//!
//! Strict mode writes exactly one:
//!
//! ```html
//! <meta property="og:title" content="Hello">
//! <meta name="twitter:card" content="summary">
//! ```
//!
//! Empty values and empty list elements produce no tag. All values are
//! escaped by maud.

use std::sync::LazyLock;

use maud::{Markup, PreEscaped, html};
use regex::{Captures, Regex};

use crate::registry::uses_name_attribute;
use crate::types::{Metadata, Prefixes};

static PREFIX_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(prefix\s*=\s*["'])"#).expect("prefix attribute pattern is valid")
});

/// Attribute naming convention for emitted tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// `property=` and `name=` on every tag.
    #[default]
    Loose,
    /// `name=` for `twitter:`/`fediverse:` keys, `property=` otherwise.
    Strict,
}

impl OutputMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            OutputMode::Strict
        } else {
            OutputMode::Loose
        }
    }
}

fn meta_tag(key: &str, value: &str, mode: OutputMode) -> Markup {
    match mode {
        OutputMode::Strict if uses_name_attribute(key) => html! {
            meta name=(key) content=(value);
        },
        OutputMode::Strict => html! {
            meta property=(key) content=(value);
        },
        OutputMode::Loose => html! {
            meta property=(key) name=(key) content=(value);
        },
    }
}

/// One `<meta>` tag per non-empty value, one tag per line, in map order.
pub fn meta_tags(metadata: &Metadata, mode: OutputMode) -> Markup {
    html! {
        @for (key, value) in metadata.iter() {
            @if !key.is_empty() && !value.is_empty() {
                @for item in value.values() {
                    @if !item.is_empty() {
                        (meta_tag(key, item, mode))
                        (PreEscaped("\n"))
                    }
                }
            }
        }
    }
}

fn escape_attribute(value: &str) -> String {
    html! { (value) }.into_string()
}

/// Add the namespace declarations to an `<html>` attribute string.
///
/// An existing `prefix="…"` attribute gets ours prepended to its value;
/// otherwise a new attribute is appended.
///
/// ```text
/// lang="en"                   → lang="en" prefix="og: http://ogp.me/ns#"
/// lang="en" prefix="fb: …"    → lang="en" prefix="og: http://ogp.me/ns# fb: …"
/// ```
pub fn prefix_attribute(existing: &str, prefixes: &Prefixes) -> String {
    let value = escape_attribute(&prefixes.to_attribute_value());
    if value.is_empty() {
        return existing.to_string();
    }

    if PREFIX_ATTRIBUTE.is_match(existing) {
        return PREFIX_ATTRIBUTE
            .replace(existing, |caps: &Captures| format!("{}{} ", &caps[1], value))
            .into_owned();
    }

    if existing.trim().is_empty() {
        format!("prefix=\"{value}\"")
    } else {
        format!("{} prefix=\"{value}\"", existing.trim_end())
    }
}
