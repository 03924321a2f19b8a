//! The host content-management system, as seen by the pipeline.
//!
//! The [`Host`] trait is the single seam between metadata resolution and
//! wherever content actually lives. Every method is a synchronous, best-effort
//! lookup: a miss is `None`, an empty string or an empty list, never an error.
//! Resolvers treat a miss as "try the next fallback".
//!
//! Two pieces of host behaviour have default implementations because they
//! only depend on the content body: [`Host::parse_blocks`] (block comment
//! parsing, see [`blocks`]) and [`Host::supports_blocks`].
//!
//! The crate ships [`MemoryHost`](memory::MemoryHost), backed by a
//! deserialized site fixture. It powers the CLI and the test suite.

pub mod blocks;
pub mod memory;

use crate::context::PostFormat;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use blocks::Block;
pub use memory::{FixtureError, MemoryHost, SiteFixture};

/// Named image sizes an attachment can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Thumbnail,
    Medium,
    Large,
    Full,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::Thumbnail => "thumbnail",
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
            ImageSize::Full => "full",
        }
    }
}

/// Kinds of attached media used for `og:audio` and `og:video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    /// Does a MIME type such as `audio/mpeg` belong to this kind?
    pub fn matches_mime(self, mime: &str) -> bool {
        let major = mime.split('/').next().unwrap_or("");
        match self {
            MediaKind::Image => major == "image",
            MediaKind::Audio => major == "audio",
            MediaKind::Video => major == "video",
        }
    }
}

/// Taxonomies the article metadata reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    Category,
    Tag,
}

/// Header image configuration of the active theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderImages {
    /// Rotate randomly between all uploaded header images.
    pub random: bool,
    /// Every uploaded header image URL.
    pub uploaded: Vec<String>,
    /// The header image currently in use when not rotating.
    pub current: Option<String>,
}

/// Site-level information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub name: String,
    /// Tagline.
    pub description: String,
    /// Attachment id of the custom logo, if one is set.
    pub logo_id: Option<u64>,
    pub header: HeaderImages,
}

/// A content item: post, page, custom type or attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: u64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub excerpt: String,
    /// Password protected and the visitor has not unlocked it.
    #[serde(default)]
    pub access_restricted: bool,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub published_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub format: Option<PostFormat>,
    /// Attachment id of the featured image.
    #[serde(default)]
    pub thumbnail_id: Option<u64>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub menu_order: i64,
    /// MIME type, for attachments.
    #[serde(default)]
    pub mime_type: String,
}

fn default_post_type() -> String {
    "post".to_string()
}

impl Content {
    pub fn new(id: u64, post_type: &str) -> Self {
        Self {
            id,
            post_type: post_type.to_string(),
            title: String::new(),
            body: String::new(),
            excerpt: String::new(),
            access_restricted: false,
            author_id: None,
            published_at: None,
            modified_at: None,
            format: None,
            thumbnail_id: None,
            parent_id: None,
            menu_order: 0,
            mime_type: String::new(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.post_type == "attachment"
    }

    /// Attachment whose MIME type is an image.
    pub fn is_image(&self) -> bool {
        self.is_attachment() && MediaKind::Image.matches_mime(&self.mime_type)
    }

    /// Posts and pages are typed `article`; other types are not.
    pub fn is_article(&self) -> bool {
        matches!(self.post_type.as_str(), "post" | "page")
    }
}

/// A taxonomy term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Term {
    pub id: u64,
    pub taxonomy: Taxonomy,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Title and description the host exposes for generic archives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveInfo {
    pub title: String,
    pub description: String,
}

/// Author profile fields, keyed by field name (`display_name`, `twitter`, ...).
pub type AuthorFields = BTreeMap<String, String>;

/// Lookups the pipeline needs from the host system.
pub trait Host {
    /// Site name, tagline, logo and header images.
    fn site(&self) -> SiteInfo;

    /// Site icon URL rendered at `size` pixels, if the site has an icon.
    fn site_icon_url(&self, size: u32) -> Option<String>;

    /// Site locale, e.g. `en_US`.
    fn locale(&self) -> String;

    fn content(&self, id: u64) -> Option<Content>;

    /// Terms of `taxonomy` attached to a content item, in host order.
    fn terms(&self, content_id: u64, taxonomy: Taxonomy) -> Vec<Term>;

    fn term(&self, id: u64) -> Option<Term>;

    /// Title/description for generic archives (date archives, custom
    /// taxonomies). Empty when the host has nothing to offer.
    fn archive(&self) -> ArchiveInfo;

    /// One stored profile field of an author; empty when unset.
    fn author_field(&self, author_id: u64, field: &str) -> String;

    /// The author's archive URL.
    fn author_url(&self, author_id: u64) -> String;

    /// The author's avatar at `size` pixels.
    fn avatar_url(&self, author_id: u64, size: u32) -> String;

    /// Canonical URL of a content item.
    fn permalink(&self, id: u64) -> String;

    /// URL of an attachment in a named size. `Full` is the original upload.
    fn attachment_url(&self, id: u64, size: ImageSize) -> Option<String>;

    /// Reverse lookup of an uploaded file URL to its attachment id.
    fn attachment_id_for_url(&self, url: &str) -> Option<u64>;

    /// Image attachments whose parent is `parent_id`, ordered by menu order
    /// then id ascending, at most `limit`.
    fn child_images(&self, parent_id: u64, limit: usize) -> Vec<u64>;

    /// Attachments of `kind` whose parent is `parent_id`.
    fn attached_media(&self, parent_id: u64, kind: MediaKind) -> Vec<u64>;

    /// Base URL every uploaded file lives under.
    fn upload_base_url(&self) -> String;

    /// Whether content bodies are block-structured.
    fn supports_blocks(&self) -> bool {
        true
    }

    /// Split a body into its top-level blocks.
    fn parse_blocks(&self, body: &str) -> Vec<Block> {
        blocks::parse_blocks(body)
    }

    /// Registered shortcode names, stripped from descriptions.
    fn shortcode_tags(&self) -> Vec<String> {
        Vec::new()
    }
}
