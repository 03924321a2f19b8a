//! Shared test utilities for the opengraph test suite.
//!
//! Builds small in-memory sites so resolver tests can describe only the
//! content they care about.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut item = post(12, "Hello", "<p>Body</p>");
//! item.content.thumbnail_id = Some(40);
//! let host = host_with(vec![item, image_attachment(40, Some(12), "beach.jpg")]);
//!
//! let metadata = Pipeline::new(OpenGraphConfig::default())
//!     .unwrap()
//!     .resolve_metadata(&host, PageContext::Singular(12));
//! ```
//!
//! Every fixture site has the same base: the site "Field Notes" at
//! `https://example.org`, and author 1 (`alice`) with a full profile. No
//! icon, logo or header image is set, so the image fallback stage finds
//! nothing unless a test adds one.

use crate::host::memory::{AuthorFixture, ContentFixture, SiteSection};
use crate::host::{AuthorFields, Content, MemoryHost, SiteFixture};

pub const SITE_URL: &str = "https://example.org";

// =========================================================================
// Content builders
// =========================================================================

/// A published post with a title and body.
pub fn post(id: u64, title: &str, body: &str) -> ContentFixture {
    let mut content = Content::new(id, "post");
    content.title = title.to_string();
    content.body = body.to_string();
    ContentFixture::new(content)
}

/// A JPEG attachment stored at `{SITE_URL}/wp-content/uploads/{file}`.
pub fn image_attachment(id: u64, parent_id: Option<u64>, file: &str) -> ContentFixture {
    let mut content = Content::new(id, "attachment");
    content.mime_type = "image/jpeg".to_string();
    content.parent_id = parent_id;
    let mut item = ContentFixture::new(content);
    item.url = Some(format!("{SITE_URL}/wp-content/uploads/{file}"));
    item
}

// =========================================================================
// Sites
// =========================================================================

/// The author every fixture site carries.
pub fn alice() -> AuthorFixture {
    let fields: AuthorFields = [
        ("nicename", "alice"),
        ("display_name", "Alice Liddell"),
        ("first_name", "Alice"),
        ("last_name", "Liddell"),
        ("description", "Writes about rabbits."),
        ("twitter", "@alice"),
        ("fediverse", "@alice@social.example"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    AuthorFixture { id: 1, fields }
}

/// A site fixture holding `content`, ready for further tweaks.
pub fn site_fixture(content: Vec<ContentFixture>) -> SiteFixture {
    SiteFixture {
        site: SiteSection {
            name: "Field Notes".to_string(),
            description: "Notes from the field".to_string(),
            url: SITE_URL.to_string(),
            ..SiteSection::default()
        },
        authors: vec![alice()],
        content,
        ..SiteFixture::default()
    }
}

/// A host serving `content` on the standard fixture site.
pub fn host_with(content: Vec<ContentFixture>) -> MemoryHost {
    MemoryHost::new(site_fixture(content))
}
