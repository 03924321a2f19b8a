//! Metadata configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! max = 3                   # Maximum og:image entries (values <= 0 mean 1)
//! size = "large"            # Attachment size used for discovered images
//! icon_size = 512           # Site icon size used by the fallback stage
//! avatar_size = 512         # Avatar size on author pages
//!
//! [excerpt]
//! length = 55               # Description length in words
//! more = " [...]"           # Appended when the description is truncated
//!
//! [output]
//! strict = false            # property= for og:, name= for twitter:/fediverse:
//!
//! [text]
//! untitled = "Untitled"
//! protected = "This content is password protected."
//!
//! [attachment_lookup]
//! size_suffix = '-(?:\d+x\d+)(\.[a-zA-Z]+)$'
//! scaled_suffix = "-scaled"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::host::ImageSize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid pattern in attachment_lookup.size_suffix: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration loaded from `config.toml`.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenGraphConfig {
    /// Image selection settings.
    pub images: ImagesConfig,
    /// Description trimming.
    pub excerpt: ExcerptConfig,
    /// Markup emission.
    pub output: OutputConfig,
    /// Fixed strings used when nothing better is available.
    pub text: TextConfig,
    /// Upload naming conventions for reverse URL lookups.
    pub attachment_lookup: AttachmentLookupConfig,
}

impl OpenGraphConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.icon_size == 0 {
            return Err(ConfigError::Validation(
                "images.icon_size must be non-zero".into(),
            ));
        }
        if self.images.avatar_size == 0 {
            return Err(ConfigError::Validation(
                "images.avatar_size must be non-zero".into(),
            ));
        }
        let pattern = Regex::new(&self.attachment_lookup.size_suffix)?;
        if pattern.captures_len() < 2 {
            return Err(ConfigError::Validation(
                "attachment_lookup.size_suffix must capture the file extension as group 1".into(),
            ));
        }
        Ok(())
    }
}

/// Image selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum number of `og:image` entries. Zero or negative means one.
    pub max: i64,
    /// Attachment size requested for every discovered image.
    pub size: ImageSize,
    /// Pixel size of the site icon used as a fallback image.
    pub icon_size: u32,
    /// Pixel size of the avatar on author pages.
    pub avatar_size: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max: 3,
            size: ImageSize::Large,
            icon_size: 512,
            avatar_size: 512,
        }
    }
}

/// Resolve the effective image limit from config.
///
/// Anything `<= 0` is treated as `1`.
pub fn effective_max_images(config: &ImagesConfig) -> usize {
    usize::try_from(config.max).unwrap_or(0).max(1)
}

/// Description trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcerptConfig {
    /// Maximum description length in words.
    pub length: usize,
    /// Suffix appended when a description was cut short.
    pub more: String,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            length: 55,
            more: " [...]".to_string(),
        }
    }
}

/// Markup emission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Emit `property=` for Open Graph and `name=` for card/identity keys,
    /// instead of both attributes on every tag.
    pub strict: bool,
}

/// Fallback strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Title when nothing else applies.
    pub untitled: String,
    /// Description of password-protected content.
    pub protected: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            untitled: "Untitled".to_string(),
            protected: "This content is password protected.".to_string(),
        }
    }
}

/// Upload naming conventions used to map an `img` URL back to its attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentLookupConfig {
    /// Pattern matching a resized-variant suffix; group 1 must capture the
    /// extension, which replaces the whole match.
    pub size_suffix: String,
    /// Suffix inserted before the extension of downscaled originals.
    pub scaled_suffix: String,
}

impl Default for AttachmentLookupConfig {
    fn default() -> Self {
        Self {
            size_suffix: r"-(?:\d+x\d+)(\.[a-zA-Z]+)$".to_string(),
            scaled_suffix: "-scaled".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(OpenGraphConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<OpenGraphConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OpenGraphConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<OpenGraphConfig, ConfigError> {
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(overlay)?;
    tracing::debug!(dir = %dir.display(), "loaded metadata config");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Open Graph Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Image selection
# ---------------------------------------------------------------------------
[images]
# Maximum number of og:image entries. Most consumers only offer the first
# few images. Zero or negative values are treated as 1.
max = 3

# Attachment size requested for discovered images:
# "thumbnail", "medium", "large" or "full".
size = "large"

# Pixel size of the site icon used when a page has no images at all.
icon_size = 512

# Pixel size of the avatar shown on author pages.
avatar_size = 512

# ---------------------------------------------------------------------------
# Descriptions
# ---------------------------------------------------------------------------
[excerpt]
# Maximum description length in words.
length = 55

# Appended when a description is cut short.
more = " [...]"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# false: every tag carries both property= and name= (widest compatibility).
# true:  property= for og:/article:/profile:, name= for twitter:/fediverse:.
strict = false

# ---------------------------------------------------------------------------
# Fallback text
# ---------------------------------------------------------------------------
[text]
untitled = "Untitled"
protected = "This content is password protected."

# ---------------------------------------------------------------------------
# Reverse lookup of image URLs found in content
# ---------------------------------------------------------------------------
[attachment_lookup]
# Resized variants look like photo-300x200.jpg. Group 1 captures the
# extension and replaces the whole match when the suffix is stripped.
size_suffix = '-(?:\d+x\d+)(\.[a-zA-Z]+)$'

# Large uploads are downscaled to photo-scaled.jpg on upload.
scaled_suffix = "-scaled"
"##
}
