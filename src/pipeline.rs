//! The metadata resolution pipeline.
//!
//! Every property is resolved by its own [`FilterChain`]: an ordered list of
//! `(priority, filter)` pairs. A chain starts from the property's empty
//! default and threads the value through each filter in turn:
//!
//! ```text
//! og:image   []  →  default(5) → blocks(15) → parsed(25) → attached(25) → fallback(35) → truncate(999)
//! og:title   ""  →  default_title(5) → (host filters…)
//! ```
//!
//! Lower priorities run first. Filters registered at the same priority run
//! in registration order, so a host can slot a resolver in anywhere: priority
//! 1 to seed a value the defaults will pass through, 100 to overwrite
//! whatever the defaults produced.
//!
//! Filters never fail. A filter that has nothing to contribute returns its
//! input untouched.
//!
//! After the per-property loop the finished [`Metadata`] map runs through the
//! post-processor chain (which adds the `article:`/`profile:` keys), and the
//! `<html>` prefix declaration runs through a chain of its own.
//!
//! ## Render context
//!
//! Filters receive a [`RenderContext`]: the host, the classified page, the
//! config, and per-render memos of the image list and shortcode patterns. The twitter card resolver
//! needs the image list while `og:image` is being resolved separately, so
//! [`RenderContext::images`] runs the image chain once and hands both callers
//! the same result.

use std::cell::{Cell, OnceCell};
use std::collections::HashMap;

use maud::Markup;

use crate::config::{ConfigError, OpenGraphConfig, effective_max_images};
use crate::context::PageContext;
use crate::emit::{self, OutputMode};
use crate::host::{Content, Host};
use crate::images::{self, AttachmentLookup};
use crate::registry::{
    FEDIVERSE_CREATOR, OG_AUDIO, OG_DESCRIPTION, OG_IMAGE, OG_LOCALE, OG_NAMESPACE, OG_SITE_NAME,
    OG_TITLE, OG_TYPE, OG_URL, OG_VIDEO, PROPERTIES, TWITTER_CARD, TWITTER_CREATOR,
};
use crate::social;
use crate::text::{self, Shortcodes};
use crate::types::{MetaValue, Metadata, Prefixes};

/// A boxed filter over values of type `T`.
pub type Filter<T> = Box<dyn Fn(T, &RenderContext<'_>) -> T>;

/// Priority of the built-in resolvers.
pub const DEFAULT_PRIORITY: i32 = 5;
/// Priority of the built-in post-processors and prefix filter.
pub const POST_PROCESS_PRIORITY: i32 = 10;

/// An ordered chain of filters, stable by registration order within a
/// priority.
pub struct FilterChain<T> {
    filters: Vec<(i32, Filter<T>)>,
}

impl<T> Default for FilterChain<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<T> FilterChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter. It runs after every filter with a lower or equal
    /// priority that is already registered.
    pub fn add<F>(&mut self, priority: i32, filter: F)
    where
        F: Fn(T, &RenderContext<'_>) -> T + 'static,
    {
        let pos = self
            .filters
            .iter()
            .position(|(p, _)| *p > priority)
            .unwrap_or(self.filters.len());
        self.filters.insert(pos, (priority, Box::new(filter)));
    }

    /// Thread `initial` through every filter in order.
    pub fn apply(&self, initial: T, cx: &RenderContext<'_>) -> T {
        self.filters
            .iter()
            .fold(initial, |value, (_, filter)| filter(value, cx))
    }

    /// Registered priorities, in execution order.
    pub fn priorities(&self) -> Vec<i32> {
        self.filters.iter().map(|(p, _)| *p).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Registered properties, their resolver chains, and the whole-map filters.
pub struct Pipeline {
    config: OpenGraphConfig,
    lookup: AttachmentLookup,
    properties: Vec<(String, MetaValue)>,
    resolvers: HashMap<String, FilterChain<MetaValue>>,
    post_processors: FilterChain<Metadata>,
    prefix_filters: FilterChain<Prefixes>,
}

impl Pipeline {
    /// A pipeline with every built-in property and no resolvers at all.
    ///
    /// Resolving with it yields every registered key with its empty default.
    pub fn empty(config: OpenGraphConfig) -> Result<Self, ConfigError> {
        let lookup = AttachmentLookup::new(&config.attachment_lookup)?;
        let mut pipeline = Self {
            config,
            lookup,
            properties: Vec::new(),
            resolvers: HashMap::new(),
            post_processors: FilterChain::new(),
            prefix_filters: FilterChain::new(),
        };
        for (key, cardinality) in PROPERTIES {
            pipeline.register_property(key, cardinality.empty());
        }
        Ok(pipeline)
    }

    /// A pipeline with the built-in properties and default resolvers.
    pub fn new(config: OpenGraphConfig) -> Result<Self, ConfigError> {
        let mut pipeline = Self::empty(config)?;
        pipeline.register_defaults();
        Ok(pipeline)
    }

    fn register_defaults(&mut self) {
        self.add_text_resolver(OG_TITLE, DEFAULT_PRIORITY, text::default_title);
        self.add_text_resolver(OG_TYPE, DEFAULT_PRIORITY, text::default_type);
        self.add_text_resolver(OG_URL, DEFAULT_PRIORITY, text::default_url);

        self.add_list_resolver(OG_IMAGE, 5, images::default_image);
        self.add_list_resolver(OG_IMAGE, 15, images::block_image);
        self.add_list_resolver(OG_IMAGE, 25, images::parsed_image);
        self.add_list_resolver(OG_IMAGE, 25, images::attached_image);
        self.add_list_resolver(OG_IMAGE, 35, images::fallback_image);
        self.add_list_resolver(OG_IMAGE, 999, images::ensure_max_images);

        self.add_text_resolver(OG_DESCRIPTION, DEFAULT_PRIORITY, |description, cx| {
            text::default_description(description, cx.config().excerpt.length, cx)
        });
        self.add_text_resolver(OG_LOCALE, DEFAULT_PRIORITY, text::default_locale);
        self.add_text_resolver(OG_SITE_NAME, DEFAULT_PRIORITY, text::default_sitename);
        self.add_list_resolver(OG_AUDIO, DEFAULT_PRIORITY, social::default_audio);
        self.add_list_resolver(OG_VIDEO, DEFAULT_PRIORITY, social::default_video);

        self.add_prefix_filter(POST_PROCESS_PRIORITY, social::additional_prefixes);
        self.add_post_processor(POST_PROCESS_PRIORITY, social::profile_metadata);
        self.add_post_processor(POST_PROCESS_PRIORITY, social::article_metadata);

        self.add_text_resolver(TWITTER_CARD, DEFAULT_PRIORITY, social::twitter_default_card);
        self.add_text_resolver(
            TWITTER_CREATOR,
            DEFAULT_PRIORITY,
            social::twitter_default_creator,
        );
        self.add_resolver(
            FEDIVERSE_CREATOR,
            DEFAULT_PRIORITY,
            social::fediverse_default_creator,
        );
    }

    pub fn config(&self) -> &OpenGraphConfig {
        &self.config
    }

    /// Register an extra property. Re-registering a key replaces its default
    /// but keeps its position.
    pub fn register_property(&mut self, key: &str, default: MetaValue) {
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = default,
            None => self.properties.push((key.to_string(), default)),
        }
    }

    /// Register a resolver for `key`. Keys need not be registered properties:
    /// a chain on an unregistered key only runs through [`RenderContext::apply`].
    pub fn add_resolver<F>(&mut self, key: &str, priority: i32, resolver: F)
    where
        F: Fn(MetaValue, &RenderContext<'_>) -> MetaValue + 'static,
    {
        self.resolvers
            .entry(key.to_string())
            .or_default()
            .add(priority, resolver);
    }

    /// Register a resolver that works on the text form of the value.
    pub fn add_text_resolver<F>(&mut self, key: &str, priority: i32, resolver: F)
    where
        F: Fn(String, &RenderContext<'_>) -> String + 'static,
    {
        self.add_resolver(key, priority, move |value, cx| {
            MetaValue::Text(resolver(value.into_text(), cx))
        });
    }

    /// Register a resolver that works on the list form of the value.
    pub fn add_list_resolver<F>(&mut self, key: &str, priority: i32, resolver: F)
    where
        F: Fn(Vec<String>, &RenderContext<'_>) -> Vec<String> + 'static,
    {
        self.add_resolver(key, priority, move |value, cx| {
            MetaValue::List(resolver(value.into_list(), cx))
        });
    }

    /// Register a whole-map transform, run after every property is resolved.
    pub fn add_post_processor<F>(&mut self, priority: i32, processor: F)
    where
        F: Fn(Metadata, &RenderContext<'_>) -> Metadata + 'static,
    {
        self.post_processors.add(priority, processor);
    }

    /// Register a transform of the `<html>` prefix declaration.
    pub fn add_prefix_filter<F>(&mut self, priority: i32, filter: F)
    where
        F: Fn(Prefixes, &RenderContext<'_>) -> Prefixes + 'static,
    {
        self.prefix_filters.add(priority, filter);
    }

    /// The resolver chain of `key`, if anything is registered on it.
    pub fn chain(&self, key: &str) -> Option<&FilterChain<MetaValue>> {
        self.resolvers.get(key)
    }

    /// Start a render of `page`.
    pub fn context<'a>(&'a self, host: &'a dyn Host, page: PageContext) -> RenderContext<'a> {
        RenderContext {
            host,
            page,
            pipeline: self,
            images: OnceCell::new(),
            resolving_images: Cell::new(false),
            shortcodes: OnceCell::new(),
        }
    }

    /// Resolve every registered property, then run the post-processors.
    pub fn resolve_metadata(&self, host: &dyn Host, page: PageContext) -> Metadata {
        self.context(host, page).resolve_metadata()
    }

    /// The namespace declarations for the `<html prefix="…">` attribute.
    pub fn prefixes(&self, host: &dyn Host, page: PageContext) -> Prefixes {
        self.context(host, page).prefixes()
    }

    /// Output mode from `[output] strict`.
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_strict(self.config.output.strict)
    }

    /// Resolve and emit the `<meta>` tags of `page`.
    pub fn meta_tags(&self, host: &dyn Host, page: PageContext) -> Markup {
        emit::meta_tags(&self.resolve_metadata(host, page), self.output_mode())
    }
}

/// Everything a filter can look at during one render.
pub struct RenderContext<'a> {
    pub host: &'a dyn Host,
    pub page: PageContext,
    pipeline: &'a Pipeline,
    images: OnceCell<Vec<String>>,
    resolving_images: Cell<bool>,
    shortcodes: OnceCell<Shortcodes>,
}

impl<'a> RenderContext<'a> {
    pub fn config(&self) -> &'a OpenGraphConfig {
        &self.pipeline.config
    }

    pub fn lookup(&self) -> &'a AttachmentLookup {
        &self.pipeline.lookup
    }

    /// Effective image limit, never below one.
    pub fn max_images(&self) -> usize {
        effective_max_images(&self.pipeline.config.images)
    }

    /// The content item shown on a singular page.
    pub fn content(&self) -> Option<Content> {
        self.page.content_id().and_then(|id| self.host.content(id))
    }

    /// The host's shortcode patterns, compiled on first use.
    pub fn shortcodes(&self) -> &Shortcodes {
        self.shortcodes
            .get_or_init(|| Shortcodes::new(&self.host.shortcode_tags()))
    }

    /// Run the chain of `key` over `initial`. Keys without resolvers return
    /// `initial` unchanged.
    ///
    /// An `og:image` request starting from the registered default is served
    /// from the per-render memo.
    pub fn apply(&self, key: &str, initial: MetaValue) -> MetaValue {
        if key == OG_IMAGE && initial == self.image_seed() {
            return MetaValue::List(self.images().to_vec());
        }
        self.run_chain(key, initial)
    }

    fn run_chain(&self, key: &str, initial: MetaValue) -> MetaValue {
        match self.pipeline.resolvers.get(key) {
            Some(chain) => {
                tracing::trace!(key, filters = chain.len(), "running resolver chain");
                chain.apply(initial, self)
            }
            None => initial,
        }
    }

    /// Registered default of `og:image`, or an empty list.
    fn image_seed(&self) -> MetaValue {
        self.pipeline
            .properties
            .iter()
            .find(|(k, _)| k == OG_IMAGE)
            .map(|(_, default)| default.clone())
            .unwrap_or_else(MetaValue::empty_list)
    }

    /// The `og:image` chain resolved from its registered default, computed
    /// once per render.
    ///
    /// While the chain is running, nested calls (an image resolver asking for
    /// the twitter card, say) see an empty list.
    pub fn images(&self) -> &[String] {
        if let Some(images) = self.images.get() {
            return images;
        }
        if self.resolving_images.replace(true) {
            tracing::debug!(page = %self.page, "image list requested while resolving images");
            return &[];
        }
        let images = self.run_chain(OG_IMAGE, self.image_seed()).into_list();
        self.resolving_images.set(false);
        tracing::debug!(page = %self.page, count = images.len(), "resolved images");
        self.images.get_or_init(|| images)
    }

    pub fn resolve_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, default) in &self.pipeline.properties {
            let value = if key == OG_IMAGE {
                MetaValue::List(self.images().to_vec())
            } else {
                self.apply(key, default.clone())
            };
            metadata.insert(key.as_str(), value);
        }
        let metadata = self.pipeline.post_processors.apply(metadata, self);
        tracing::debug!(page = %self.page, keys = metadata.len(), "resolved metadata");
        metadata
    }

    pub fn prefixes(&self) -> Prefixes {
        let mut prefixes = Prefixes::new();
        prefixes.insert("og", OG_NAMESPACE);
        self.pipeline.prefix_filters.apply(prefixes, self)
    }
}
