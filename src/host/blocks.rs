//! Block comment parsing.
//!
//! Block-structured bodies delimit blocks with HTML comments:
//!
//! ```text
//! <!-- wp:image {"id":42,"sizeSlug":"large"} -->
//! <figure class="wp-block-image"><img src="..."/></figure>
//! <!-- /wp:image -->
//! <!-- wp:separator /-->
//! ```
//!
//! Names without a namespace belong to `core/`. Only top-level blocks are
//! returned; blocks nested inside a group or columns block are skipped, which
//! matches how the image stages walk content.

use serde_json::{Map, Value};
use std::sync::LazyLock;

use regex::Regex;

static BLOCK_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--\s+(?P<closer>/)?wp:(?P<name>[a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?)\s+(?:(?P<attrs>\{.*?\})\s+)?(?P<void>/)?-->",
    )
    .expect("block delimiter pattern is valid")
});

/// A parsed block: its fully-qualified name and JSON attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub attrs: Map<String, Value>,
}

impl Block {
    pub fn new(name: impl Into<String>, attrs: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    /// The attachment id carried by image-like blocks (`"id": 42`).
    pub fn attachment_id(&self) -> Option<u64> {
        self.attrs.get("id").and_then(Value::as_u64)
    }
}

/// Parse the top-level blocks of a body, in document order.
///
/// Malformed attribute JSON leaves the block with empty attributes rather
/// than dropping it.
pub fn parse_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut depth: usize = 0;

    for caps in BLOCK_DELIMITER.captures_iter(body) {
        if caps.name("closer").is_some() {
            depth = depth.saturating_sub(1);
            continue;
        }

        if depth == 0 {
            let raw_name = &caps["name"];
            let name = if raw_name.contains('/') {
                raw_name.to_string()
            } else {
                format!("core/{raw_name}")
            };
            let attrs = caps
                .name("attrs")
                .and_then(|m| serde_json::from_str::<Map<String, Value>>(m.as_str()).ok())
                .unwrap_or_default();
            blocks.push(Block::new(name, attrs));
        }

        if caps.name("void").is_none() {
            depth += 1;
        }
    }

    blocks
}
