//! Default resolvers for the text properties, and the text clean-up helpers
//! they share.
//!
//! Each `default_*` resolver passes a non-empty incoming value through
//! untouched; only an empty value is derived from the page. That is what
//! lets a host resolver registered at a lower priority win over the defaults.
//!
//! ## Title fallbacks
//!
//! ```text
//! home / front page   site name
//! singular            content title, or the first 5 words of the description
//! author              display name
//! category / tag      term name
//! format archive      format label ("Gallery", "Image", ...)
//! other archive       host archive title
//! anything else       "Untitled"
//! ```
//!
//! ## Description fallbacks
//!
//! ```text
//! singular            protected notice, excerpt, or body
//! author              profile description
//! category / tag      term description
//! other archive       host archive description
//! anything else       site tagline
//! ```
//!
//! Descriptions have shortcodes and markup removed, then are cut to
//! `excerpt.length` words with `excerpt.more` appended.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::PageContext;
use crate::pipeline::RenderContext;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script>|<style[^>]*?>.*?</style>")
        .expect("script/style pattern is valid")
});

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static URL_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9\-~+_.?#=!&;,/:%@$|*'()\[\]\x{80}-\x{10FFFF}]")
        .expect("url character pattern is valid")
});

/// URL schemes kept by [`esc_url`].
const ALLOWED_PROTOCOLS: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "irc6", "ircs", "gopher", "nntp",
    "feed", "telnet", "mms", "rtsp", "sms", "svn", "tel", "fax", "xmpp", "webcal", "urn",
];

/// Words kept when a singular page's title falls back to its description.
const TITLE_FROM_DESCRIPTION_WORDS: usize = 5;

/// Remove `<script>`/`<style>` elements with their content, then every tag,
/// then surrounding whitespace.
pub fn strip_all_tags(text: &str) -> String {
    let text = SCRIPT_OR_STYLE.replace_all(text, "");
    let text = HTML_TAG.replace_all(&text, "");
    text.trim().to_string()
}

/// Compiled patterns for the registered shortcodes.
///
/// Enclosing shortcodes (`[caption]…[/caption]`) need one pattern per name
/// since the closing tag must repeat the opening name. Self-closing and
/// unclosed ones (`[gallery ids="1,2"]`) share one alternation.
#[derive(Debug, Clone, Default)]
pub struct Shortcodes {
    enclosing: Vec<Regex>,
    single: Option<Regex>,
}

impl Shortcodes {
    pub fn new(tags: &[String]) -> Self {
        let names: Vec<String> = tags
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();

        let enclosing = names
            .iter()
            .filter_map(|name| {
                let pattern = format!(r"(?s)\[{name}(?:\s[^\]]*)?\].*?\[/{name}\]");
                Regex::new(&pattern)
                    .inspect_err(|e| tracing::debug!(name = %name, error = %e, "skipping shortcode"))
                    .ok()
            })
            .collect();

        let single = if names.is_empty() {
            None
        } else {
            let pattern = format!(r"\[(?:{})(?:\s[^\]]*)?/?\]", names.join("|"));
            Regex::new(&pattern)
                .inspect_err(|e| tracing::debug!(error = %e, "skipping shortcodes"))
                .ok()
        };

        Self { enclosing, single }
    }

    /// Remove every registered shortcode, enclosing ones together with their
    /// content.
    pub fn strip(&self, text: &str) -> String {
        if !text.contains('[') {
            return text.to_string();
        }
        let mut text = text.to_string();
        for re in self.enclosing.iter().chain(self.single.as_ref()) {
            text = re.replace_all(&text, "").into_owned();
        }
        text
    }
}

/// Keep the first `length` whitespace-separated words. When words were
/// dropped, `more` is appended.
///
/// Runs of whitespace collapse to single spaces either way.
pub fn trim_words(text: &str, length: usize, more: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > length {
        format!("{}{}", words[..length].join(" "), more)
    } else {
        words.join(" ")
    }
}

/// Make a URL safe for an attribute: spaces become `%20`, characters outside
/// the URL alphabet are dropped, and unknown schemes empty the URL.
/// Scheme-less URLs that are not relative get `http://`.
pub fn esc_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let url = url.replace(' ', "%20");
    let url = URL_DISALLOWED.replace_all(&url, "").into_owned();
    if url.is_empty() {
        return url;
    }

    if !url.contains(':') && !url.starts_with(['/', '#', '?']) {
        return format!("http://{url}");
    }

    if let Some((scheme, _)) = url.split_once(':') {
        let relative = scheme.contains(['/', '?', '#']);
        if !relative && !ALLOWED_PROTOCOLS.contains(&scheme.to_ascii_lowercase().as_str()) {
            tracing::debug!(url = %url, "dropping url with disallowed scheme");
            return String::new();
        }
    }
    url
}

/// `og:title`.
pub fn default_title(title: String, cx: &RenderContext<'_>) -> String {
    if !title.is_empty() {
        return title;
    }

    let title = match cx.page {
        page if page.is_home() => cx.host.site().name,
        PageContext::Singular(_) | PageContext::Attachment(_) => {
            let title = cx.content().map(|c| c.title).unwrap_or_default();
            if title.is_empty() {
                default_description(String::new(), TITLE_FROM_DESCRIPTION_WORDS, cx)
            } else {
                title
            }
        }
        PageContext::Author(id) => cx.host.author_field(id, "display_name"),
        _ => archive_title(cx),
    };

    strip_all_tags(&title)
}

fn archive_title(cx: &RenderContext<'_>) -> String {
    let term_name = cx
        .page
        .term_id()
        .and_then(|id| cx.host.term(id))
        .map(|term| term.name)
        .filter(|name| !name.is_empty());
    if let Some(name) = term_name {
        return name;
    }

    if let PageContext::Archive(Some(format)) = cx.page {
        return format.label().to_string();
    }

    if cx.page.is_archive() {
        let archive = cx.host.archive();
        if !archive.title.is_empty() {
            return archive.title;
        }
    }

    cx.config().text.untitled.clone()
}

/// `og:description`, cut to `length` words.
pub fn default_description(description: String, length: usize, cx: &RenderContext<'_>) -> String {
    if !description.is_empty() {
        return description;
    }

    let description = match cx.page {
        PageContext::Singular(_) | PageContext::Attachment(_) => match cx.content() {
            Some(content) if content.access_restricted => cx.config().text.protected.clone(),
            Some(content) if !content.excerpt.is_empty() => content.excerpt,
            Some(content) => content.body,
            None => String::new(),
        },
        PageContext::Author(id) => cx.host.author_field(id, "description"),
        _ => archive_description(cx),
    };

    let description = cx.shortcodes().strip(&description);
    let description = strip_all_tags(&description);
    let description = trim_words(&description, length, &cx.config().excerpt.more);
    strip_all_tags(&description)
}

fn archive_description(cx: &RenderContext<'_>) -> String {
    let term_description = cx
        .page
        .term_id()
        .and_then(|id| cx.host.term(id))
        .map(|term| term.description)
        .filter(|d| !d.is_empty());
    if let Some(description) = term_description {
        return description;
    }

    if cx.page.is_archive() {
        let archive = cx.host.archive();
        if !archive.description.is_empty() {
            return archive.description;
        }
    }

    cx.host.site().description
}

/// `og:type`: `article` for posts and pages, `profile` for authors,
/// `website` for everything else.
pub fn default_type(kind: String, cx: &RenderContext<'_>) -> String {
    if !kind.is_empty() {
        return kind;
    }
    if cx.page.is_singular() && cx.content().is_some_and(|c| c.is_article()) {
        "article".to_string()
    } else if cx.page.is_author() {
        "profile".to_string()
    } else {
        "website".to_string()
    }
}

/// `og:url`: permalink on singular pages, author archive on author pages.
pub fn default_url(url: String, cx: &RenderContext<'_>) -> String {
    let url = if url.is_empty() {
        match cx.page {
            PageContext::Singular(id) | PageContext::Attachment(id) => cx.host.permalink(id),
            PageContext::Author(id) => cx.host.author_url(id),
            _ => url,
        }
    } else {
        url
    };
    esc_url(&url)
}

/// `og:site_name`.
pub fn default_sitename(name: String, cx: &RenderContext<'_>) -> String {
    let name = if name.is_empty() {
        cx.host.site().name
    } else {
        name
    };
    strip_all_tags(&name)
}

/// `og:locale`.
pub fn default_locale(locale: String, cx: &RenderContext<'_>) -> String {
    if locale.is_empty() {
        cx.host.locale()
    } else {
        locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenGraphConfig;
    use crate::context::PostFormat;
    use crate::host::{ArchiveInfo, MemoryHost, Taxonomy, Term};
    use crate::pipeline::Pipeline;
    use crate::test_helpers::*;

    fn with_cx<R>(host: &MemoryHost, page: PageContext, f: impl FnOnce(&RenderContext<'_>) -> R) -> R {
        let pipeline = Pipeline::new(OpenGraphConfig::default()).unwrap();
        let cx = pipeline.context(host, page);
        f(&cx)
    }

    fn words(n: usize) -> String {
        "word ".repeat(n)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn strip_all_tags_drops_scripts_and_markup() {
        let html = "<p>Hello <b>there</b></p><script>alert('x')</script><style>p{}</style> ";
        assert_eq!(strip_all_tags(html), "Hello there");
    }

    #[test]
    fn shortcodes_removes_registered_only() {
        let shortcodes = Shortcodes::new(&["gallery".to_string(), "caption".to_string()]);
        let text = r#"Intro [gallery ids="1,2"] middle [caption id="x"]<img src="a.jpg"> A cat[/caption] end [unknown]"#;
        assert_eq!(shortcodes.strip(text), "Intro  middle  end [unknown]");
    }

    #[test]
    fn shortcodes_do_not_match_prefixes() {
        let shortcodes = Shortcodes::new(&["gallery".to_string()]);
        assert_eq!(shortcodes.strip("[gallery-wide] [gallery/]"), "[gallery-wide] ");
    }

    #[test]
    fn shortcodes_escape_names_and_skip_empty() {
        let shortcodes = Shortcodes::new(&[String::new(), "a.b".to_string()]);
        assert_eq!(shortcodes.strip("[a.b] [axb] []"), " [axb] []");
        assert_eq!(Shortcodes::default().strip("[gallery]"), "[gallery]");
    }

    #[test]
    fn shortcode_patterns_built_once_per_render() {
        let mut fixture = site_fixture(Vec::new());
        fixture.site.shortcodes = vec!["gallery".into()];
        let host = MemoryHost::new(fixture);
        with_cx(&host, PageContext::Home, |cx| {
            assert!(std::ptr::eq(cx.shortcodes(), cx.shortcodes()));
            assert_eq!(cx.shortcodes().strip("a [gallery] b"), "a  b");
        });
    }

    #[test]
    fn trim_words_appends_more_only_when_cut() {
        assert_eq!(trim_words("one two three", 2, " [...]"), "one two [...]");
        assert_eq!(trim_words("one two three", 3, " [...]"), "one two three");
        assert_eq!(trim_words("  one\n\ttwo  ", 5, " [...]"), "one two");
    }

    #[test]
    fn trim_words_length_bound() {
        for length in [0, 1, 10, 55] {
            let out = trim_words(&words(60), length, "…");
            let body = out.strip_suffix('…').unwrap();
            assert_eq!(body.split_whitespace().count(), length);
        }
    }

    #[test]
    fn esc_url_cleans_and_filters() {
        assert_eq!(esc_url(" https://example.org/a b "), "https://example.org/a%20b");
        assert_eq!(esc_url("https://example.org/<x>\"y\""), "https://example.org/xy");
        assert_eq!(esc_url("example.org/page"), "http://example.org/page");
        assert_eq!(esc_url("/relative/path"), "/relative/path");
        assert_eq!(esc_url("javascript:alert(1)"), "");
        assert_eq!(esc_url("mailto:a@example.org"), "mailto:a@example.org");
        assert_eq!(esc_url(""), "");
    }

    // =========================================================================
    // Title
    // =========================================================================

    #[test]
    fn non_empty_title_passes_through() {
        let host = host_with(vec![post(12, "Hello", "")]);
        for page in [PageContext::Home, PageContext::Singular(12), PageContext::Author(1)] {
            let title = with_cx(&host, page, |cx| default_title("<b>Kept</b>".into(), cx));
            assert_eq!(title, "<b>Kept</b>");
        }
    }

    #[test]
    fn title_by_page_kind() {
        let mut fixture = site_fixture(vec![post(12, "Hello <em>World</em>", "")]);
        fixture.terms.push(Term {
            id: 7,
            taxonomy: Taxonomy::Category,
            name: "Travel".into(),
            description: String::new(),
        });
        fixture.archive = ArchiveInfo {
            title: "Year: 2024".into(),
            description: String::new(),
        };
        let host = MemoryHost::new(fixture);

        let cases = [
            (PageContext::Home, "Field Notes"),
            (PageContext::FrontPage, "Field Notes"),
            (PageContext::Singular(12), "Hello World"),
            (PageContext::Author(1), "Alice Liddell"),
            (PageContext::Category(7), "Travel"),
            (PageContext::Archive(Some(PostFormat::Gallery)), "Gallery"),
            (PageContext::Archive(None), "Year: 2024"),
            (PageContext::NotFound, "Untitled"),
        ];
        for (page, expected) in cases {
            let title = with_cx(&host, page, |cx| default_title(String::new(), cx));
            assert_eq!(title, expected, "{page}");
        }
    }

    #[test]
    fn untitled_content_uses_description_words() {
        let host = host_with(vec![post(12, "", "one two three four five six seven")]);
        let title = with_cx(&host, PageContext::Singular(12), |cx| {
            default_title(String::new(), cx)
        });
        assert_eq!(title, "one two three four five [...]");
    }

    #[test]
    fn nameless_term_falls_back_to_archive_title() {
        let mut fixture = site_fixture(Vec::new());
        fixture.terms.push(Term {
            id: 9,
            taxonomy: Taxonomy::Tag,
            name: String::new(),
            description: String::new(),
        });
        fixture.archive.title = "Tag: (none)".into();
        let host = MemoryHost::new(fixture);
        let title = with_cx(&host, PageContext::Tag(9), |cx| default_title(String::new(), cx));
        assert_eq!(title, "Tag: (none)");
    }

    // =========================================================================
    // Description
    // =========================================================================

    #[test]
    fn description_prefers_excerpt() {
        let mut item = post(12, "Hello", "Body text");
        item.content.excerpt = "<p>Short excerpt</p>".into();
        let host = host_with(vec![item]);
        let description = with_cx(&host, PageContext::Singular(12), |cx| {
            default_description(String::new(), 55, cx)
        });
        assert_eq!(description, "Short excerpt");
    }

    #[test]
    fn protected_content_hides_body() {
        let mut item = post(12, "Hello", "Secret body");
        item.content.access_restricted = true;
        item.content.excerpt = "Secret excerpt".into();
        let host = host_with(vec![item]);
        let description = with_cx(&host, PageContext::Singular(12), |cx| {
            default_description(String::new(), 55, cx)
        });
        assert_eq!(description, "This content is password protected.");
    }

    #[test]
    fn long_body_is_trimmed_with_more() {
        let host = host_with(vec![post(12, "Hello", &words(60))]);
        let description = with_cx(&host, PageContext::Singular(12), |cx| {
            default_description(String::new(), 55, cx)
        });
        assert_eq!(description, format!("{} [...]", words(55).trim_end()));
    }

    #[test]
    fn short_body_is_not_marked_as_trimmed() {
        let host = host_with(vec![post(12, "Hello", &words(55))]);
        let description = with_cx(&host, PageContext::Singular(12), |cx| {
            default_description(String::new(), 55, cx)
        });
        assert_eq!(description, words(55).trim_end());
    }

    #[test]
    fn description_strips_shortcodes_and_markup() {
        let mut fixture = site_fixture(vec![post(
            12,
            "Hello",
            r#"<p>Look [gallery ids="1"] at <a href="/x">this</a></p>"#,
        )]);
        fixture.site.shortcodes = vec!["gallery".into()];
        let host = MemoryHost::new(fixture);
        let description = with_cx(&host, PageContext::Singular(12), |cx| {
            default_description(String::new(), 55, cx)
        });
        assert_eq!(description, "Look at this");
    }

    #[test]
    fn description_by_page_kind() {
        let mut fixture = site_fixture(Vec::new());
        fixture.terms.push(Term {
            id: 7,
            taxonomy: Taxonomy::Category,
            name: "Travel".into(),
            description: "<p>Trips and places</p>".into(),
        });
        fixture.terms.push(Term {
            id: 9,
            taxonomy: Taxonomy::Tag,
            name: "beach".into(),
            description: String::new(),
        });
        fixture.archive.description = "Everything from 2024".into();
        let host = MemoryHost::new(fixture);

        let cases = [
            (PageContext::Home, "Notes from the field"),
            (PageContext::Author(1), "Writes about rabbits."),
            (PageContext::Category(7), "Trips and places"),
            (PageContext::Tag(9), "Everything from 2024"),
            (PageContext::Archive(None), "Everything from 2024"),
            (PageContext::NotFound, "Notes from the field"),
        ];
        for (page, expected) in cases {
            let description = with_cx(&host, page, |cx| default_description(String::new(), 55, cx));
            assert_eq!(description, expected, "{page}");
        }
    }

    #[test]
    fn configured_more_suffix() {
        let host = host_with(vec![post(12, "Hello", &words(10))]);
        let mut config = OpenGraphConfig::default();
        config.excerpt.more = "…".into();
        config.excerpt.length = 3;
        let pipeline = Pipeline::new(config).unwrap();
        let metadata = pipeline.resolve_metadata(&host, PageContext::Singular(12));
        assert_eq!(
            metadata.get("og:description").unwrap().as_text(),
            "word word word…"
        );
    }

    // =========================================================================
    // Type, url, site name, locale
    // =========================================================================

    #[test]
    fn type_by_page_kind() {
        let mut product = post(13, "Widget", "");
        product.content.post_type = "product".into();
        let host = host_with(vec![post(12, "Hello", ""), product]);

        let cases = [
            (PageContext::Singular(12), "article"),
            (PageContext::Singular(13), "website"),
            (PageContext::Author(1), "profile"),
            (PageContext::Home, "website"),
        ];
        for (page, expected) in cases {
            let kind = with_cx(&host, page, |cx| default_type(String::new(), cx));
            assert_eq!(kind, expected, "{page}");
        }
    }

    #[test]
    fn url_by_page_kind() {
        let host = host_with(vec![post(12, "Hello", "")]);
        let cases = [
            (PageContext::Singular(12), "https://example.org/?p=12"),
            (PageContext::Author(1), "https://example.org/author/alice/"),
            (PageContext::Home, ""),
        ];
        for (page, expected) in cases {
            let url = with_cx(&host, page, |cx| default_url(String::new(), cx));
            assert_eq!(url, expected, "{page}");
        }
    }

    #[test]
    fn url_override_is_still_escaped() {
        let host = host_with(Vec::new());
        let url = with_cx(&host, PageContext::Home, |cx| {
            default_url("https://example.org/a page".into(), cx)
        });
        assert_eq!(url, "https://example.org/a%20page");
    }

    #[test]
    fn site_name_and_locale() {
        let mut fixture = site_fixture(Vec::new());
        fixture.site.name = "Field <i>Notes</i>".into();
        fixture.site.locale = "de_DE".into();
        let host = MemoryHost::new(fixture);
        with_cx(&host, PageContext::Home, |cx| {
            assert_eq!(default_sitename(String::new(), cx), "Field Notes");
            assert_eq!(default_locale(String::new(), cx), "de_DE");
            assert_eq!(default_locale("fr_FR".into(), cx), "fr_FR");
        });
    }
}
