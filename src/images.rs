//! Image discovery for `og:image`.
//!
//! The image chain is a sequence of stages, each appending what it finds to
//! the list accumulated so far:
//!
//! | Priority | Stage | Source |
//! |----------|-------|--------|
//! | 5 | [`default_image`] | author avatar, attachment itself, featured image |
//! | 15 | [`block_image`] | image and cover blocks in the body |
//! | 25 | [`parsed_image`] | `<img>` tags pointing into the uploads directory |
//! | 25 | [`attached_image`] | image attachments of the content item |
//! | 35 | [`fallback_image`] | site icon, logo, header images |
//! | 999 | [`ensure_max_images`] | truncation |
//!
//! The order runs from the most specific image to the most generic one. Every
//! stage stops adding once the list holds `images.max` entries, skips empty
//! URLs, and never appends a URL that is already present. Author pages are
//! the exception: the default stage replaces the list with the avatar alone.
//!
//! ## Reverse URL lookup
//!
//! `<img>` tags carry URLs, not attachment ids, and the URL in the markup is
//! often a resized variant of the upload. [`AttachmentLookup`] tries, in
//! order:
//!
//! ```text
//! https://example.org/uploads/beach-300x200.jpg?w=300   exact
//! https://example.org/uploads/beach-300x200.jpg         query string stripped
//! https://example.org/uploads/beach.jpg                 size suffix stripped
//! https://example.org/uploads/beach-scaled.jpg          scaled suffix added
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::{AttachmentLookupConfig, ConfigError};
use crate::host::Host;
use crate::pipeline::RenderContext;

static FILE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.[a-zA-Z]+)$").expect("extension pattern is valid"));

/// Append `url` unless it is empty or already present.
fn push_unique(images: &mut Vec<String>, url: String) {
    if !url.is_empty() && !images.contains(&url) {
        images.push(url);
    }
}

/// Drop empty entries and repeated URLs, keeping the first occurrence.
pub fn unique(images: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(images.len());
    for url in images {
        push_unique(&mut out, url);
    }
    out
}

/// Stage 5: avatar on author pages, otherwise the attachment or featured image.
pub fn default_image(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    if let Some(author_id) = cx.page.author_id() {
        let avatar = cx.host.avatar_url(author_id, cx.config().images.avatar_size);
        return vec![avatar];
    }

    if images.len() >= cx.max_images() {
        return images;
    }

    let mut images = unique(images);
    let size = cx.config().images.size;
    let Some(content) = cx.content() else {
        return images;
    };

    let image_id = if cx.page.is_attachment() {
        Some(content.id).filter(|_| content.is_image())
    } else {
        content.thumbnail_id
    };
    if let Some(url) = image_id.and_then(|id| cx.host.attachment_url(id, size)) {
        push_unique(&mut images, url);
    }

    images
}

/// Singular, non-attachment content whose body the content stages may scan.
fn scannable_body(cx: &RenderContext<'_>) -> Option<String> {
    if !cx.page.is_singular() || cx.page.is_attachment() || !cx.host.supports_blocks() {
        return None;
    }
    cx.content().map(|c| c.body)
}

/// Stage 15: `core/image` and `core/cover` blocks carrying an attachment id.
pub fn block_image(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    let max = cx.max_images();
    if images.len() >= max {
        return images;
    }
    let Some(body) = scannable_body(cx) else {
        return images;
    };

    let mut images = unique(images);
    let size = cx.config().images.size;
    for block in cx.host.parse_blocks(&body) {
        if images.len() >= max {
            break;
        }
        if block.name != "core/image" && block.name != "core/cover" {
            continue;
        }
        let Some(id) = block.attachment_id() else {
            continue;
        };
        match cx.host.attachment_url(id, size) {
            Some(url) => push_unique(&mut images, url),
            None => tracing::trace!(block = %block.name, id, "block attachment has no url"),
        }
    }
    images
}

/// `src` attributes of every `<img>` tag, in document order.
pub fn img_sources(html: &str) -> Vec<String> {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return Vec::new();
    };
    dom.nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter(|tag| tag.name().as_utf8_str().eq_ignore_ascii_case("img"))
        .filter_map(|tag| {
            tag.attributes()
                .get("src")
                .flatten()
                .map(|src| src.as_utf8_str().replace("&amp;", "&"))
        })
        .collect()
}

/// Stage 25: `<img>` tags whose source lives in the uploads directory.
pub fn parsed_image(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    let max = cx.max_images();
    if images.len() >= max {
        return images;
    }
    let Some(body) = scannable_body(cx) else {
        return images;
    };
    let base = cx.host.upload_base_url();
    if base.is_empty() {
        return images;
    }

    let mut images = unique(images);
    let size = cx.config().images.size;
    for src in img_sources(&body) {
        if images.len() >= max {
            break;
        }
        if !src.starts_with(&base) {
            continue;
        }
        match cx.lookup().resolve(cx.host, &src) {
            Some(id) => {
                if let Some(url) = cx.host.attachment_url(id, size) {
                    push_unique(&mut images, url);
                }
            }
            None => tracing::trace!(src = %src, "no attachment for embedded image"),
        }
    }
    images
}

/// Stage 25 (after parsed): image attachments of the content item.
pub fn attached_image(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    let max = cx.max_images();
    if images.len() >= max || !cx.page.is_singular() || cx.page.is_attachment() {
        return images;
    }
    let Some(id) = cx.page.content_id() else {
        return images;
    };

    let mut images = unique(images);
    let size = cx.config().images.size;
    for child in cx.host.child_images(id, max) {
        if images.len() >= max {
            break;
        }
        if let Some(url) = cx.host.attachment_url(child, size) {
            push_unique(&mut images, url);
        }
    }
    images
}

/// Stage 35: site icon, then custom logo, then header images, but only when
/// nothing else was found.
pub fn fallback_image(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    if images.iter().any(|url| !url.is_empty()) {
        return images;
    }

    let max = cx.max_images();
    let mut images = Vec::new();
    let site = cx.host.site();

    if let Some(icon) = cx.host.site_icon_url(cx.config().images.icon_size) {
        push_unique(&mut images, icon);
    }

    if images.is_empty() {
        let size = cx.config().images.size;
        if let Some(logo) = site.logo_id.and_then(|id| cx.host.attachment_url(id, size)) {
            push_unique(&mut images, logo);
        }
    }

    if images.is_empty() {
        if site.header.random {
            for header in site.header.uploaded {
                push_unique(&mut images, header);
                if images.len() >= max {
                    break;
                }
            }
        } else if let Some(header) = site.header.current {
            push_unique(&mut images, header);
        }
    }

    if !images.is_empty() {
        tracing::debug!(page = %cx.page, count = images.len(), "using site fallback images");
    }
    images
}

/// Stage 999: drop repeats, then cut the list down to the image limit.
///
/// Lists seeded at or above the limit skip every earlier stage, so this is
/// the only place their duplicates are removed.
pub fn ensure_max_images(images: Vec<String>, cx: &RenderContext<'_>) -> Vec<String> {
    let mut images = unique(images);
    images.truncate(cx.max_images());
    images
}

/// Maps an uploaded file URL back to its attachment id.
#[derive(Debug, Clone)]
pub struct AttachmentLookup {
    size_suffix: Regex,
    scaled_suffix: String,
}

impl AttachmentLookup {
    pub fn new(config: &AttachmentLookupConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            size_suffix: Regex::new(&config.size_suffix)?,
            scaled_suffix: config.scaled_suffix.clone(),
        })
    }

    /// Try the exact URL, then without query string, then without a size
    /// suffix, then with the scaled suffix. Each step builds on the URL the
    /// previous step produced.
    pub fn resolve(&self, host: &dyn Host, src: &str) -> Option<u64> {
        if let Some(id) = host.attachment_id_for_url(src) {
            return Some(id);
        }

        let mut src = src.split('?').next().unwrap_or(src).to_string();
        if let Some(id) = host.attachment_id_for_url(&src) {
            return Some(id);
        }

        if self.size_suffix.is_match(&src) {
            src = self.size_suffix.replacen(&src, 1, "$1").into_owned();
            if let Some(id) = host.attachment_id_for_url(&src) {
                return Some(id);
            }
        }

        if FILE_EXTENSION.is_match(&src) {
            let scaled = FILE_EXTENSION
                .replace(&src, |caps: &Captures| {
                    format!("{}{}", self.scaled_suffix, &caps[1])
                })
                .into_owned();
            return host.attachment_id_for_url(&scaled);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenGraphConfig;
    use crate::context::PageContext;
    use crate::host::MemoryHost;
    use crate::pipeline::Pipeline;
    use crate::test_helpers::*;

    const UPLOADS: &str = "https://example.org/wp-content/uploads";

    fn upload(name: &str) -> String {
        format!("{UPLOADS}/{name}")
    }

    fn config_with_max(max: i64) -> OpenGraphConfig {
        let mut config = OpenGraphConfig::default();
        config.images.max = max;
        config
    }

    fn images_for(host: &MemoryHost, page: PageContext, config: OpenGraphConfig) -> Vec<String> {
        let pipeline = Pipeline::new(config).unwrap();
        pipeline.context(host, page).images().to_vec()
    }

    fn lookup() -> AttachmentLookup {
        AttachmentLookup::new(&AttachmentLookupConfig::default()).unwrap()
    }

    // =========================================================================
    // AttachmentLookup
    // =========================================================================

    #[test]
    fn lookup_exact_url() {
        let host = host_with(vec![image_attachment(40, None, "beach.jpg")]);
        assert_eq!(lookup().resolve(&host, &upload("beach.jpg")), Some(40));
    }

    #[test]
    fn lookup_strips_query_string() {
        let host = host_with(vec![image_attachment(40, None, "beach.jpg")]);
        assert_eq!(
            lookup().resolve(&host, &upload("beach.jpg?resize=300")),
            Some(40)
        );
    }

    #[test]
    fn lookup_strips_size_suffix() {
        let host = host_with(vec![image_attachment(40, None, "beach.jpg")]);
        assert_eq!(
            lookup().resolve(&host, &upload("beach-300x200.jpg?v=2")),
            Some(40)
        );
    }

    #[test]
    fn lookup_prefers_file_literally_named_with_size() {
        let host = host_with(vec![
            image_attachment(40, None, "beach.jpg"),
            image_attachment(41, None, "beach-300x200.jpg"),
        ]);
        assert_eq!(lookup().resolve(&host, &upload("beach-300x200.jpg")), Some(41));
    }

    #[test]
    fn lookup_adds_scaled_suffix() {
        let host = host_with(vec![image_attachment(40, None, "big-scaled.jpg")]);
        assert_eq!(lookup().resolve(&host, &upload("big-1024x768.jpg")), Some(40));
        assert_eq!(lookup().resolve(&host, &upload("big.jpg")), Some(40));
    }

    #[test]
    fn lookup_miss_is_none() {
        let host = host_with(vec![image_attachment(40, None, "beach.jpg")]);
        assert_eq!(lookup().resolve(&host, &upload("forest.jpg")), None);
        assert_eq!(lookup().resolve(&host, &upload("no-extension")), None);
    }

    #[test]
    fn lookup_uses_configured_suffixes() {
        let config = AttachmentLookupConfig {
            size_suffix: r"_w\d+(\.[a-z]+)$".into(),
            scaled_suffix: "_orig".into(),
        };
        let custom = AttachmentLookup::new(&config).unwrap();
        let host = host_with(vec![
            image_attachment(40, None, "beach.jpg"),
            image_attachment(41, None, "pier_orig.png"),
        ]);
        assert_eq!(custom.resolve(&host, &upload("beach_w640.jpg")), Some(40));
        assert_eq!(custom.resolve(&host, &upload("pier.png")), Some(41));
    }

    // =========================================================================
    // img_sources
    // =========================================================================

    #[test]
    fn img_sources_in_document_order() {
        let html = r#"<p>One <img src="a.jpg" alt="a"></p>
<div><figure><img src="b.jpg"/></figure></div>
<img alt="no source"><img src="c.jpg?x=1&amp;y=2">"#;
        assert_eq!(img_sources(html), vec!["a.jpg", "b.jpg", "c.jpg?x=1&y=2"]);
    }

    // =========================================================================
    // Default stage
    // =========================================================================

    #[test]
    fn author_page_returns_only_avatar() {
        let mut item = post(12, "Hello", "");
        item.content.author_id = Some(1);
        let host = host_with(vec![item, image_attachment(40, Some(12), "a.jpg")]);

        let images = images_for(&host, PageContext::Author(1), OpenGraphConfig::default());
        assert_eq!(images, vec!["https://example.org/avatar/1?s=512"]);
    }

    #[test]
    fn thumbnail_comes_first() {
        let mut item = post(12, "Hello", "");
        item.content.thumbnail_id = Some(41);
        let host = host_with(vec![
            item,
            image_attachment(40, Some(12), "a.jpg"),
            image_attachment(41, None, "featured.jpg"),
        ]);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("featured.jpg"), upload("a.jpg")]);
    }

    #[test]
    fn attachment_page_uses_large_size() {
        let mut attachment = image_attachment(40, None, "beach.jpg");
        attachment
            .sizes
            .insert("large".into(), upload("beach-1024x768.jpg"));
        let host = host_with(vec![attachment]);

        let images = images_for(&host, PageContext::Attachment(40), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("beach-1024x768.jpg")]);
    }

    #[test]
    fn non_image_attachment_page_has_no_image() {
        let mut audio = image_attachment(42, None, "talk.mp3");
        audio.content.mime_type = "audio/mpeg".into();
        let host = host_with(vec![audio]);

        let images = images_for(&host, PageContext::Attachment(42), OpenGraphConfig::default());
        assert!(images.is_empty());
    }

    // =========================================================================
    // Content stages
    // =========================================================================

    #[test]
    fn block_images_in_body_order() {
        let body = r#"<!-- wp:cover {"id":41} -->
<div></div>
<!-- /wp:cover -->
<!-- wp:image {"id":40} -->
<figure></figure>
<!-- /wp:image -->
<!-- wp:image -->
<figure></figure>
<!-- /wp:image -->"#;
        let host = host_with(vec![
            post(12, "Hello", body),
            image_attachment(40, None, "a.jpg"),
            image_attachment(41, None, "b.jpg"),
        ]);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("b.jpg"), upload("a.jpg")]);
    }

    #[test]
    fn parsed_images_only_from_uploads() {
        let body = format!(
            r#"<p><img src="https://cdn.example.net/x.jpg"><img src="{}"></p>"#,
            upload("a-300x200.jpg")
        );
        let host = host_with(vec![
            post(12, "Hello", &body),
            image_attachment(40, None, "a.jpg"),
        ]);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("a.jpg")]);
    }

    #[test]
    fn content_stages_skipped_without_block_support() {
        let body = format!(
            r#"<!-- wp:image {{"id":40}} --><img src="{}"><!-- /wp:image -->"#,
            upload("b.jpg")
        );
        let mut fixture = site_fixture(vec![
            post(12, "Hello", &body),
            image_attachment(40, None, "a.jpg"),
            image_attachment(41, None, "b.jpg"),
        ]);
        fixture.site.supports_blocks = false;
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert!(images.is_empty());
    }

    #[test]
    fn attached_images_by_menu_order_then_id() {
        let mut late = image_attachment(40, Some(12), "late.jpg");
        late.content.menu_order = 5;
        let host = host_with(vec![
            post(12, "Hello", ""),
            late,
            image_attachment(44, Some(12), "second.jpg"),
            image_attachment(43, Some(12), "first.jpg"),
        ]);

        let images = images_for(&host, PageContext::Singular(12), config_with_max(10));
        assert_eq!(
            images,
            vec![upload("first.jpg"), upload("second.jpg"), upload("late.jpg")]
        );
    }

    #[test]
    fn duplicates_across_stages_are_dropped() {
        let mut item = post(
            12,
            "Hello",
            r#"<!-- wp:image {"id":40} --><figure></figure><!-- /wp:image -->"#,
        );
        item.content.thumbnail_id = Some(40);
        let host = host_with(vec![item, image_attachment(40, Some(12), "a.jpg")]);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("a.jpg")]);
    }

    // =========================================================================
    // Limits
    // =========================================================================

    #[test]
    fn list_never_exceeds_max() {
        let mut content = vec![post(12, "Hello", "")];
        for id in 40..50 {
            content.push(image_attachment(id, Some(12), &format!("{id}.jpg")));
        }
        let host = host_with(content);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images.len(), 3);
        assert_eq!(images[0], upload("40.jpg"));
    }

    #[test]
    fn non_positive_max_means_one() {
        let mut content = vec![post(12, "Hello", "")];
        for id in 40..45 {
            content.push(image_attachment(id, Some(12), &format!("{id}.jpg")));
        }
        let host = host_with(content);

        for max in [0, -3] {
            let images = images_for(&host, PageContext::Singular(12), config_with_max(max));
            assert_eq!(images, vec![upload("40.jpg")], "max = {max}");
        }
    }

    #[test]
    fn truncation_applies_to_seeded_lists() {
        let host = host_with(vec![post(12, "Hello", "")]);
        let mut pipeline = Pipeline::new(config_with_max(2)).unwrap();
        pipeline.add_list_resolver(crate::registry::OG_IMAGE, 1, |_, _| {
            vec!["1.jpg".into(), "2.jpg".into(), "3.jpg".into()]
        });
        let images = pipeline
            .context(&host, PageContext::Singular(12))
            .images()
            .to_vec();
        assert_eq!(images, vec!["1.jpg", "2.jpg"]);
    }

    #[test]
    fn seeded_duplicates_are_removed() {
        let host = host_with(vec![post(12, "Hello", "")]);
        let mut pipeline = Pipeline::new(OpenGraphConfig::default()).unwrap();
        pipeline.add_list_resolver(crate::registry::OG_IMAGE, 1, |_, _| {
            vec!["a.jpg".into(), "a.jpg".into(), "b.jpg".into()]
        });
        let metadata = pipeline.resolve_metadata(&host, PageContext::Singular(12));
        assert_eq!(metadata.get("og:image").unwrap().values(), vec!["a.jpg", "b.jpg"]);
    }

    // =========================================================================
    // Fallback stage
    // =========================================================================

    #[test]
    fn fallback_prefers_site_icon() {
        let mut fixture = site_fixture(vec![post(12, "Hello", "")]);
        fixture.site.icon_url = Some("https://example.org/icon-{size}.png".into());
        fixture.site.header.current = Some(upload("header.jpg"));
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec!["https://example.org/icon-512.png"]);
    }

    #[test]
    fn fallback_uses_logo_url() {
        let mut fixture = site_fixture(vec![image_attachment(90, None, "logo.png")]);
        fixture.site.logo_id = Some(90);
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Home, OpenGraphConfig::default());
        assert_eq!(images, vec![upload("logo.png")]);
    }

    #[test]
    fn fallback_logo_wins_over_header() {
        let mut fixture = site_fixture(vec![image_attachment(90, None, "logo.png")]);
        fixture.site.logo_id = Some(90);
        fixture.site.header.current = Some(upload("header.jpg"));
        fixture.site.header.uploaded = vec![upload("header.jpg")];
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Home, OpenGraphConfig::default());
        assert_eq!(images, vec![upload("logo.png")]);
    }

    #[test]
    fn fallback_random_headers_up_to_max() {
        let mut fixture = site_fixture(Vec::new());
        fixture.site.header.random = true;
        fixture.site.header.uploaded = (1..=5).map(|i| upload(&format!("h{i}.jpg"))).collect();
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Home, config_with_max(2));
        assert_eq!(images, vec![upload("h1.jpg"), upload("h2.jpg")]);
    }

    #[test]
    fn fallback_current_header() {
        let mut fixture = site_fixture(Vec::new());
        fixture.site.header.current = Some(upload("header.jpg"));
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::NotFound, OpenGraphConfig::default());
        assert_eq!(images, vec![upload("header.jpg")]);
    }

    #[test]
    fn fallback_skipped_when_content_has_images() {
        let mut fixture = site_fixture(vec![
            post(12, "Hello", ""),
            image_attachment(40, Some(12), "a.jpg"),
        ]);
        fixture.site.icon_url = Some("https://example.org/icon-{size}.png".into());
        let host = MemoryHost::new(fixture);

        let images = images_for(&host, PageContext::Singular(12), OpenGraphConfig::default());
        assert_eq!(images, vec![upload("a.jpg")]);
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let images = unique(vec![
            "b".into(),
            "a".into(),
            String::new(),
            "b".into(),
        ]);
        assert_eq!(images, vec!["b", "a"]);
    }
}
