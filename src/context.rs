//! Page classification.
//!
//! Every resolver branches on what kind of page is being rendered. Instead of
//! querying global request state, the caller classifies the request once into
//! a [`PageContext`] and the pipeline passes it to every resolver, which keeps
//! resolvers pure functions of `(value, context)`.
//!
//! ## Page addresses
//!
//! The CLI and tests name pages with a short address string:
//!
//! ```text
//! home            blog index
//! front           static front page
//! post:12         singular content item 12 (post, page, custom type)
//! attachment:40   attachment page for item 40
//! author:3        author archive for user 3
//! category:7      category archive for term 7
//! tag:9           tag archive for term 9
//! archive         any other archive (date, custom taxonomy, ...)
//! archive:gallery post-format archive
//! 404             nothing matched
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PageParseError {
    #[error("unknown page kind '{0}' (expected home, front, post, attachment, author, category, tag, archive or 404)")]
    UnknownKind(String),
    #[error("page kind '{0}' requires a numeric id, e.g. '{0}:12'")]
    MissingId(String),
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("unknown post format '{0}'")]
    UnknownFormat(String),
}

/// Post formats a content item (or a format archive) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFormat {
    Standard,
    Aside,
    Chat,
    Gallery,
    Link,
    Image,
    Quote,
    Status,
    Video,
    Audio,
}

impl PostFormat {
    /// Human-readable label, used as the title of a format archive.
    pub fn label(self) -> &'static str {
        match self {
            PostFormat::Standard => "Standard",
            PostFormat::Aside => "Aside",
            PostFormat::Chat => "Chat",
            PostFormat::Gallery => "Gallery",
            PostFormat::Link => "Link",
            PostFormat::Image => "Image",
            PostFormat::Quote => "Quote",
            PostFormat::Status => "Status",
            PostFormat::Video => "Video",
            PostFormat::Audio => "Audio",
        }
    }

    /// Formats that are mostly a picture get the large card.
    pub fn is_visual(self) -> bool {
        matches!(self, PostFormat::Image | PostFormat::Gallery)
    }
}

impl FromStr for PostFormat {
    type Err = PageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "standard" => PostFormat::Standard,
            "aside" => PostFormat::Aside,
            "chat" => PostFormat::Chat,
            "gallery" => PostFormat::Gallery,
            "link" => PostFormat::Link,
            "image" => PostFormat::Image,
            "quote" => PostFormat::Quote,
            "status" => PostFormat::Status,
            "video" => PostFormat::Video,
            "audio" => PostFormat::Audio,
            _ => return Err(PageParseError::UnknownFormat(s.to_string())),
        })
    }
}

/// What the current request is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContext {
    /// Blog posts index.
    Home,
    /// Static front page.
    FrontPage,
    /// A single content item (post, page or custom type).
    Singular(u64),
    /// The page of a single attachment. Also counts as singular.
    Attachment(u64),
    /// An author (identity) archive.
    Author(u64),
    /// A category archive.
    Category(u64),
    /// A tag archive.
    Tag(u64),
    /// Any other archive, optionally a post-format archive.
    Archive(Option<PostFormat>),
    NotFound,
}

impl PageContext {
    pub fn is_home(self) -> bool {
        matches!(self, PageContext::Home | PageContext::FrontPage)
    }

    /// Singular content, attachments included.
    pub fn is_singular(self) -> bool {
        matches!(self, PageContext::Singular(_) | PageContext::Attachment(_))
    }

    pub fn is_attachment(self) -> bool {
        matches!(self, PageContext::Attachment(_))
    }

    pub fn is_author(self) -> bool {
        matches!(self, PageContext::Author(_))
    }

    /// Archives of any kind: author, taxonomy, format and generic archives.
    pub fn is_archive(self) -> bool {
        matches!(
            self,
            PageContext::Author(_)
                | PageContext::Category(_)
                | PageContext::Tag(_)
                | PageContext::Archive(_)
        )
    }

    /// The content item id for singular pages.
    pub fn content_id(self) -> Option<u64> {
        match self {
            PageContext::Singular(id) | PageContext::Attachment(id) => Some(id),
            _ => None,
        }
    }

    /// The author id on author archives.
    pub fn author_id(self) -> Option<u64> {
        match self {
            PageContext::Author(id) => Some(id),
            _ => None,
        }
    }

    /// The term id on category and tag archives.
    pub fn term_id(self) -> Option<u64> {
        match self {
            PageContext::Category(id) | PageContext::Tag(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageContext::Home => write!(f, "home"),
            PageContext::FrontPage => write!(f, "front"),
            PageContext::Singular(id) => write!(f, "post:{id}"),
            PageContext::Attachment(id) => write!(f, "attachment:{id}"),
            PageContext::Author(id) => write!(f, "author:{id}"),
            PageContext::Category(id) => write!(f, "category:{id}"),
            PageContext::Tag(id) => write!(f, "tag:{id}"),
            PageContext::Archive(None) => write!(f, "archive"),
            PageContext::Archive(Some(format)) => {
                write!(f, "archive:{}", format.label().to_ascii_lowercase())
            }
            PageContext::NotFound => write!(f, "404"),
        }
    }
}

impl FromStr for PageContext {
    type Err = PageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };

        let id = || -> Result<u64, PageParseError> {
            let arg = arg.ok_or_else(|| PageParseError::MissingId(kind.to_string()))?;
            arg.parse()
                .map_err(|_| PageParseError::InvalidId(arg.to_string()))
        };

        match kind {
            "home" => Ok(PageContext::Home),
            "front" => Ok(PageContext::FrontPage),
            "post" | "page" | "singular" => Ok(PageContext::Singular(id()?)),
            "attachment" => Ok(PageContext::Attachment(id()?)),
            "author" => Ok(PageContext::Author(id()?)),
            "category" => Ok(PageContext::Category(id()?)),
            "tag" => Ok(PageContext::Tag(id()?)),
            "archive" => match arg {
                Some(format) => Ok(PageContext::Archive(Some(format.parse()?))),
                None => Ok(PageContext::Archive(None)),
            },
            "404" => Ok(PageContext::NotFound),
            other => Err(PageParseError::UnknownKind(other.to_string())),
        }
    }
}
