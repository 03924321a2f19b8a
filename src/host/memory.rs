//! An in-memory host backed by a site fixture file.
//!
//! ## Fixture format
//!
//! ```toml
//! [site]
//! name = "Field Notes"
//! description = "Notes from the field"
//! url = "https://example.org"
//! locale = "en_US"
//! icon_url = "https://example.org/icon-{size}.png"   # optional, {size} is substituted
//! logo_id = 90                                       # optional attachment id
//! shortcodes = ["gallery", "caption"]
//!
//! [site.header]
//! random = false
//! current = "https://example.org/wp-content/uploads/header.jpg"
//!
//! [archive]
//! title = "Archives: 2024"
//!
//! [[authors]]
//! id = 1
//! nicename = "alice"
//! display_name = "Alice Liddell"
//! twitter = "@alice"
//! fediverse = "alice@social.example"
//!
//! [[terms]]
//! id = 7
//! taxonomy = "category"
//! name = "Travel"
//!
//! [[content]]
//! id = 12
//! title = "Hello"
//! body = "..."
//! author_id = 1
//! published_at = "2024-05-01T09:30:00+02:00"
//! thumbnail_id = 40
//! terms = [7]
//!
//! [[content]]
//! id = 40
//! post_type = "attachment"
//! mime_type = "image/jpeg"
//! parent_id = 12
//! url = "https://example.org/wp-content/uploads/2024/05/beach.jpg"
//! sizes = { large = "https://example.org/wp-content/uploads/2024/05/beach-1024x768.jpg" }
//! ```
//!
//! Author fields are free-form: every key other than `id` is available
//! through [`Host::author_field`]. `url` and `avatar` override the derived
//! author archive and avatar URLs.

use super::{
    ArchiveInfo, AuthorFields, Content, HeaderImages, Host, ImageSize, MediaKind, SiteInfo,
    Taxonomy, Term,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported fixture format (expected .toml or .json): {0}")]
    UnknownFormat(PathBuf),
}

/// The `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub name: String,
    pub description: String,
    /// Home URL without trailing slash.
    pub url: String,
    pub locale: String,
    /// Icon URL template; `{size}` is replaced with the requested size.
    pub icon_url: Option<String>,
    pub logo_id: Option<u64>,
    /// Defaults to `{url}/wp-content/uploads`.
    pub upload_base_url: Option<String>,
    pub supports_blocks: bool,
    pub shortcodes: Vec<String>,
    pub header: HeaderImages,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            url: String::new(),
            locale: "en_US".to_string(),
            icon_url: None,
            logo_id: None,
            upload_base_url: None,
            supports_blocks: true,
            shortcodes: Vec::new(),
            header: HeaderImages::default(),
        }
    }
}

/// One `[[authors]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorFixture {
    pub id: u64,
    #[serde(flatten)]
    pub fields: AuthorFields,
}

/// One `[[content]]` entry: a content item plus how the host addresses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFixture {
    #[serde(flatten)]
    pub content: Content,
    /// Overrides the derived permalink.
    #[serde(default)]
    pub permalink: Option<String>,
    /// Original upload URL, for attachments.
    #[serde(default)]
    pub url: Option<String>,
    /// Resized variants keyed by size name (`large`, `medium`, ...).
    #[serde(default)]
    pub sizes: BTreeMap<String, String>,
    /// Ids of the terms (categories and tags) assigned to the item.
    #[serde(default)]
    pub terms: Vec<u64>,
}

impl ContentFixture {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            permalink: None,
            url: None,
            sizes: BTreeMap::new(),
            terms: Vec::new(),
        }
    }
}

/// A whole site as plain data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteFixture {
    pub site: SiteSection,
    pub archive: ArchiveInfo,
    pub authors: Vec<AuthorFixture>,
    pub terms: Vec<Term>,
    pub content: Vec<ContentFixture>,
}

impl SiteFixture {
    /// Load a fixture from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(FixtureError::UnknownFormat(path.to_path_buf())),
        }
    }
}

/// [`Host`] implementation answering every lookup from a [`SiteFixture`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    fixture: SiteFixture,
}

impl MemoryHost {
    pub fn new(fixture: SiteFixture) -> Self {
        Self { fixture }
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::new(SiteFixture::load(path)?))
    }

    fn item(&self, id: u64) -> Option<&ContentFixture> {
        self.fixture.content.iter().find(|c| c.content.id == id)
    }

    fn author(&self, id: u64) -> Option<&AuthorFixture> {
        self.fixture.authors.iter().find(|a| a.id == id)
    }

    fn home(&self) -> &str {
        self.fixture.site.url.trim_end_matches('/')
    }

    /// Attachments under `parent_id` matching `kind`, by menu order then id.
    fn children(&self, parent_id: u64, kind: MediaKind) -> Vec<&ContentFixture> {
        let mut children: Vec<&ContentFixture> = self
            .fixture
            .content
            .iter()
            .filter(|c| {
                c.content.is_attachment()
                    && c.content.parent_id == Some(parent_id)
                    && kind.matches_mime(&c.content.mime_type)
            })
            .collect();
        children.sort_by_key(|c| (c.content.menu_order, c.content.id));
        children
    }
}

impl Host for MemoryHost {
    fn site(&self) -> SiteInfo {
        let site = &self.fixture.site;
        SiteInfo {
            name: site.name.clone(),
            description: site.description.clone(),
            logo_id: site.logo_id,
            header: site.header.clone(),
        }
    }

    fn site_icon_url(&self, size: u32) -> Option<String> {
        self.fixture
            .site
            .icon_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| u.replace("{size}", &size.to_string()))
    }

    fn locale(&self) -> String {
        self.fixture.site.locale.clone()
    }

    fn content(&self, id: u64) -> Option<Content> {
        self.item(id).map(|c| c.content.clone())
    }

    fn terms(&self, content_id: u64, taxonomy: Taxonomy) -> Vec<Term> {
        let Some(item) = self.item(content_id) else {
            return Vec::new();
        };
        item.terms
            .iter()
            .filter_map(|id| self.term(*id))
            .filter(|t| t.taxonomy == taxonomy)
            .collect()
    }

    fn term(&self, id: u64) -> Option<Term> {
        self.fixture.terms.iter().find(|t| t.id == id).cloned()
    }

    fn archive(&self) -> ArchiveInfo {
        self.fixture.archive.clone()
    }

    fn author_field(&self, author_id: u64, field: &str) -> String {
        self.author(author_id)
            .and_then(|a| a.fields.get(field))
            .cloned()
            .unwrap_or_default()
    }

    fn author_url(&self, author_id: u64) -> String {
        let Some(author) = self.author(author_id) else {
            return String::new();
        };
        if let Some(url) = author.fields.get("url").filter(|u| !u.is_empty()) {
            return url.clone();
        }
        match author.fields.get("nicename").filter(|n| !n.is_empty()) {
            Some(nicename) => format!("{}/author/{}/", self.home(), nicename),
            None => format!("{}/?author={}", self.home(), author_id),
        }
    }

    fn avatar_url(&self, author_id: u64, size: u32) -> String {
        match self
            .author(author_id)
            .and_then(|a| a.fields.get("avatar"))
            .filter(|u| !u.is_empty())
        {
            Some(template) => template.replace("{size}", &size.to_string()),
            None => format!("{}/avatar/{}?s={}", self.home(), author_id, size),
        }
    }

    fn permalink(&self, id: u64) -> String {
        let Some(item) = self.item(id) else {
            return String::new();
        };
        if let Some(permalink) = item.permalink.as_ref().filter(|p| !p.is_empty()) {
            return permalink.clone();
        }
        if item.content.is_attachment() {
            format!("{}/?attachment_id={}", self.home(), id)
        } else {
            format!("{}/?p={}", self.home(), id)
        }
    }

    fn attachment_url(&self, id: u64, size: ImageSize) -> Option<String> {
        let item = self.item(id).filter(|c| c.content.is_attachment())?;
        let original = item.url.as_ref().filter(|u| !u.is_empty());
        match size {
            ImageSize::Full => original.cloned(),
            _ => item
                .sizes
                .get(size.as_str())
                .filter(|u| !u.is_empty())
                .or(original)
                .cloned(),
        }
    }

    fn attachment_id_for_url(&self, url: &str) -> Option<u64> {
        self.fixture
            .content
            .iter()
            .find(|c| c.content.is_attachment() && c.url.as_deref() == Some(url))
            .map(|c| c.content.id)
    }

    fn child_images(&self, parent_id: u64, limit: usize) -> Vec<u64> {
        self.children(parent_id, MediaKind::Image)
            .into_iter()
            .take(limit)
            .map(|c| c.content.id)
            .collect()
    }

    fn attached_media(&self, parent_id: u64, kind: MediaKind) -> Vec<u64> {
        self.children(parent_id, kind)
            .into_iter()
            .map(|c| c.content.id)
            .collect()
    }

    fn upload_base_url(&self) -> String {
        match &self.fixture.site.upload_base_url {
            Some(base) => base.clone(),
            None if self.home().is_empty() => String::new(),
            None => format!("{}/wp-content/uploads", self.home()),
        }
    }

    fn supports_blocks(&self) -> bool {
        self.fixture.site.supports_blocks
    }

    fn shortcode_tags(&self) -> Vec<String> {
        self.fixture.site.shortcodes.clone()
    }
}
