//! Canonical property names, their empty defaults, and namespace URIs.
//!
//! Three namespaces are resolved for every page:
//!
//! | Namespace | Keys | Consumer |
//! |-----------|------|----------|
//! | `og:` | title, type, image, url, audio, description, determiner, locale, site_name, video | Open Graph |
//! | `twitter:` | card, creator | Twitter/X cards |
//! | `fediverse:` | creator | Mastodon author attribution |
//!
//! `article:` and `profile:` keys are not registered properties. They are
//! added by post-processors on the pages where they apply.

use crate::types::MetaValue;

/// Namespace URI of the Open Graph core vocabulary.
pub const OG_NAMESPACE: &str = "http://ogp.me/ns#";
/// Namespace URI of the `profile:` vocabulary.
pub const PROFILE_NAMESPACE: &str = "http://ogp.me/ns/profile#";
/// Namespace URI of the `article:` vocabulary.
pub const ARTICLE_NAMESPACE: &str = "http://ogp.me/ns/article#";

pub const OG_TITLE: &str = "og:title";
pub const OG_TYPE: &str = "og:type";
pub const OG_IMAGE: &str = "og:image";
pub const OG_URL: &str = "og:url";
pub const OG_AUDIO: &str = "og:audio";
pub const OG_DESCRIPTION: &str = "og:description";
pub const OG_DETERMINER: &str = "og:determiner";
pub const OG_LOCALE: &str = "og:locale";
pub const OG_SITE_NAME: &str = "og:site_name";
pub const OG_VIDEO: &str = "og:video";
pub const TWITTER_CARD: &str = "twitter:card";
pub const TWITTER_CREATOR: &str = "twitter:creator";
pub const FEDIVERSE_CREATOR: &str = "fediverse:creator";

/// Whether a property holds one string or a list of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
}

impl Cardinality {
    /// The empty starting value of a chain for this cardinality.
    pub fn empty(self) -> MetaValue {
        match self {
            Cardinality::Single => MetaValue::empty_text(),
            Cardinality::Multiple => MetaValue::empty_list(),
        }
    }
}

/// Built-in properties in resolution (and emission) order.
pub const PROPERTIES: &[(&str, Cardinality)] = &[
    (OG_TITLE, Cardinality::Single),
    (OG_TYPE, Cardinality::Single),
    (OG_IMAGE, Cardinality::Multiple),
    (OG_URL, Cardinality::Single),
    (OG_AUDIO, Cardinality::Multiple),
    (OG_DESCRIPTION, Cardinality::Single),
    (OG_DETERMINER, Cardinality::Single),
    (OG_LOCALE, Cardinality::Single),
    (OG_SITE_NAME, Cardinality::Single),
    (OG_VIDEO, Cardinality::Multiple),
    (TWITTER_CARD, Cardinality::Single),
    (TWITTER_CREATOR, Cardinality::Single),
    (FEDIVERSE_CREATOR, Cardinality::Multiple),
];

/// Emission convention of a key: `property=` for RDFa vocabularies,
/// `name=` for the card and identity vocabularies.
pub fn uses_name_attribute(key: &str) -> bool {
    key.starts_with("twitter:") || key.starts_with("fediverse:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_unique() {
        let mut keys: Vec<&str> = PROPERTIES.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), PROPERTIES.len());
    }

    #[test]
    fn list_properties_start_as_empty_lists() {
        for (key, cardinality) in PROPERTIES {
            let empty = cardinality.empty();
            assert!(empty.is_empty(), "{key}");
            let is_list = matches!(empty, MetaValue::List(_));
            let expect_list = matches!(
                *key,
                OG_IMAGE | OG_AUDIO | OG_VIDEO | FEDIVERSE_CREATOR
            );
            assert_eq!(is_list, expect_list, "{key}");
        }
    }

    #[test]
    fn name_attribute_namespaces() {
        assert!(uses_name_attribute("twitter:card"));
        assert!(uses_name_attribute("fediverse:creator"));
        assert!(!uses_name_attribute("og:title"));
        assert!(!uses_name_attribute("article:tag"));
    }
}
