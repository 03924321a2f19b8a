//! Card and identity resolvers, attached media, and the `article:` /
//! `profile:` post-processors.
//!
//! Author profile fields read here:
//!
//! | Field | Used for |
//! |-------|----------|
//! | `twitter` | `twitter:creator`, as `@handle` or a profile URL |
//! | `fediverse` | `fediverse:creator`, as `user@host` |
//! | `facebook` | second `article:author` entry |
//! | `first_name`, `last_name`, `nicename` | `profile:*` on author pages |

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use regex::Regex;

use crate::host::{ImageSize, MediaKind, Taxonomy};
use crate::pipeline::RenderContext;
use crate::registry::{ARTICLE_NAMESPACE, PROFILE_NAMESPACE};
use crate::types::{MetaValue, Metadata, Prefixes};

static TWITTER_PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?(?:twitter|x)\.com/(?:#!/)?(\w+)")
        .expect("twitter url pattern is valid")
});

static TWITTER_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?(\w+)$").expect("twitter handle pattern is valid"));

/// `twitter:card`: `summary_large_image` for visual posts, posts with a
/// featured image, or pages with more than one image; `summary` otherwise.
pub fn twitter_default_card(card: String, cx: &RenderContext<'_>) -> String {
    if !card.is_empty() {
        return card;
    }

    if cx.page.is_singular() {
        let content = cx.content();
        let visual = content
            .as_ref()
            .and_then(|c| c.format)
            .is_some_and(|format| format.is_visual());
        let has_thumbnail = content.as_ref().is_some_and(|c| c.thumbnail_id.is_some());

        if visual || has_thumbnail || cx.images().len() > 1 {
            return "summary_large_image".to_string();
        }
    }
    "summary".to_string()
}

/// Normalize a stored twitter field to `@handle`.
///
/// Accepts `handle`, `@handle` and profile URLs on twitter.com or x.com.
pub fn normalize_twitter_handle(value: &str) -> Option<String> {
    let value = value.trim();
    TWITTER_PROFILE_URL
        .captures(value)
        .or_else(|| TWITTER_HANDLE.captures(value))
        .map(|caps| format!("@{}", &caps[1]))
}

/// `twitter:creator` from the content author's `twitter` field.
pub fn twitter_default_creator(creator: String, cx: &RenderContext<'_>) -> String {
    if !creator.is_empty() || !cx.page.is_singular() {
        return creator;
    }
    let Some(author_id) = cx.content().and_then(|c| c.author_id) else {
        return creator;
    };

    let twitter = cx.host.author_field(author_id, "twitter");
    if twitter.is_empty() {
        return creator;
    }
    match normalize_twitter_handle(&twitter) {
        Some(handle) => handle,
        None => {
            tracing::debug!(author_id, twitter = %twitter, "unrecognized twitter field");
            creator
        }
    }
}

/// Normalize a stored fediverse field to a bare `user@host`.
pub fn normalize_fediverse_handle(value: &str) -> String {
    value
        .trim()
        .replace("acct:", "")
        .trim_start_matches('@')
        .to_string()
}

/// `fediverse:creator` from the content author's `fediverse` field.
pub fn fediverse_default_creator(creator: MetaValue, cx: &RenderContext<'_>) -> MetaValue {
    if !creator.is_empty() || !cx.page.is_singular() {
        return creator;
    }
    let Some(author_id) = cx.content().and_then(|c| c.author_id) else {
        return creator;
    };

    let fediverse = cx.host.author_field(author_id, "fediverse");
    let handle = normalize_fediverse_handle(&fediverse);
    if handle.is_empty() {
        return creator;
    }
    MetaValue::Text(handle)
}

fn attached_media_urls(
    mut urls: Vec<String>,
    kind: MediaKind,
    cx: &RenderContext<'_>,
) -> Vec<String> {
    let Some(id) = cx.page.content_id() else {
        return urls;
    };
    for media_id in cx.host.attached_media(id, kind) {
        match cx.host.attachment_url(media_id, ImageSize::Full) {
            Some(url) if !url.is_empty() => urls.push(url),
            _ => tracing::trace!(media_id, "attached media has no url"),
        }
    }
    urls
}

/// `og:audio`: audio files attached to the content item.
pub fn default_audio(audio: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    attached_media_urls(audio, MediaKind::Audio, cx)
}

/// `og:video`: video files attached to the content item.
pub fn default_video(video: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    attached_media_urls(video, MediaKind::Video, cx)
}

/// Declare `profile:` on author pages and `article:` on singular pages.
pub fn additional_prefixes(mut prefixes: Prefixes, cx: &RenderContext<'_>) -> Prefixes {
    if cx.page.is_author() {
        prefixes.insert("profile", PROFILE_NAMESPACE);
    }
    if cx.page.is_singular() {
        prefixes.insert("article", ARTICLE_NAMESPACE);
    }
    prefixes
}

/// `profile:first_name`, `profile:last_name` and `profile:username` on
/// author pages.
pub fn profile_metadata(mut metadata: Metadata, cx: &RenderContext<'_>) -> Metadata {
    let Some(id) = cx.page.author_id() else {
        return metadata;
    };
    metadata.insert("profile:first_name", cx.host.author_field(id, "first_name"));
    metadata.insert("profile:last_name", cx.host.author_field(id, "last_name"));
    metadata.insert("profile:username", cx.host.author_field(id, "nicename"));
    metadata
}

fn iso8601(time: Option<DateTime<FixedOffset>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_default()
}

/// `article:*` keys on singular pages: tags, section, timestamps, authors.
pub fn article_metadata(mut metadata: Metadata, cx: &RenderContext<'_>) -> Metadata {
    if !cx.page.is_singular() {
        return metadata;
    }
    let Some(content) = cx.content() else {
        return metadata;
    };

    for tag in cx.host.terms(content.id, Taxonomy::Tag) {
        metadata.push("article:tag", tag.name);
    }
    if let Some(section) = cx.host.terms(content.id, Taxonomy::Category).into_iter().next() {
        metadata.push("article:section", section.name);
    }

    metadata.insert("article:published_time", iso8601(content.published_at));
    metadata.insert("article:modified_time", iso8601(content.modified_at));

    if let Some(author_id) = content.author_id {
        metadata.push("article:author", cx.host.author_url(author_id));
        let facebook = cx.host.author_field(author_id, "facebook");
        if !facebook.is_empty() {
            metadata.push("article:author", facebook);
        }
    }
    metadata
}
