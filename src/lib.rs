//! # opengraph
//!
//! Open Graph, Twitter Card and Fediverse metadata for the pages of a
//! content-managed site. Values are derived from the page's content model
//! (title, description, images, media, URL, locale, article and profile
//! attributes) and written as `<meta>` tags for the document head.
//!
//! # Architecture: Resolver Chains
//!
//! Every property is resolved by an ordered chain of filters. Each filter
//! receives the value accumulated so far and returns it unchanged, extended,
//! or replaced:
//!
//! ```text
//! PageContext ──► Pipeline ──► og:title   ""  → default_title → …
//!      │                       og:image   []  → default → blocks → parsed → attached → fallback → truncate
//!      │                       …
//!      │                       post-processors (article:*, profile:*)
//!      ▼                                   │
//!    Host  ◄──── lookups ──────────────────┘
//!                                          ▼
//!                                 Metadata ──► emit ──► <meta …>
//! ```
//!
//! The chains are plain data: hosts register their own resolvers at any
//! priority, before or after the defaults, and add whole-map
//! post-processors.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | `FilterChain`, `Pipeline` registry, per-render `RenderContext` |
//! | [`registry`] | Property names, empty defaults, namespace URIs |
//! | [`images`] | The `og:image` stages and reverse URL → attachment lookup |
//! | [`text`] | Title/description/url/type defaults, tag and shortcode stripping |
//! | [`social`] | Card type, creators, audio/video, article and profile keys |
//! | [`context`] | `PageContext` page classification and page addresses |
//! | [`host`] | The `Host` trait, block parsing, fixture-backed `MemoryHost` |
//! | [`emit`] | `<meta>` tag and `prefix` attribute markup via Maud |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`types`] | `Metadata`, `MetaValue`, `Prefixes` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Page Context
//!
//! Resolvers never consult ambient request state. The caller classifies the
//! request once into a [`context::PageContext`] and every resolver receives
//! it, so a resolver is a function of `(value, context)` and tests need no
//! setup beyond a fixture site.
//!
//! ## Absence Is Empty, Never an Error
//!
//! Every lookup on the [`host::Host`] trait is best-effort. A miss is an
//! empty string, an empty list or `None`, and the resolver moves on to its
//! next fallback. Every registered key is present in the resolved map even
//! when empty; empties are dropped only when tags are emitted. The only
//! fallible operations are at the edges: loading config and fixtures.
//!
//! ## Memoized Image Chain
//!
//! The card type depends on how many images the page has, so the image
//! chain is needed twice per render. [`pipeline::RenderContext::images`]
//! computes it once and both callers share the result.
//!
//! ## Maud for Markup
//!
//! Tags are built with [Maud](https://maud.lambda.xyz/), so every value is
//! escaped by construction.

pub mod config;
pub mod context;
pub mod emit;
pub mod host;
pub mod images;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod social;
pub mod text;
pub mod types;

pub use config::OpenGraphConfig;
pub use context::PageContext;
pub use pipeline::{Pipeline, RenderContext};
pub use types::{MetaValue, Metadata, Prefixes};

#[cfg(test)]
pub(crate) mod test_helpers;
