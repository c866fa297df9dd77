//! Pipeline configuration.
//!
//! The rendition table, encoding quality and manifest constants live in an
//! immutable [`PipelineConfig`] handed to
//! [`Pipeline::new`](crate::process::Pipeline::new). Nothing reads settings
//! from globals.
//!
//! ## Config File Location
//!
//! An optional `pipeline.toml` in the content root (or any path passed with
//! `--config`) overrides the stock defaults:
//!
//! ```text
//! workshops/
//! ├── pipeline.toml            # Optional, sparse overrides
//! ├── birdhouse/
//! │   ├── project.yaml
//! │   └── IMG_0001.jpg
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [[renditions]]            # Ordered smallest to largest
//! name = "thumb"
//! bound = 400               # Longer edge, in pixels
//!
//! [[renditions]]
//! name = "medium"
//! bound = 800
//!
//! [[renditions]]
//! name = "large"
//! bound = 1200
//!
//! [[renditions]]
//! name = "xlarge"
//! bound = 2000
//!
//! [encoding]
//! quality = 85              # JPEG/WebP quality (1-100); PNG is lossless
//!
//! [manifest]
//! url_prefix = "/workshops"
//! sizes_hint = "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 33vw"
//!
//! [processing]
//! skip_policy = "per-rendition"   # or "marker"
//! max_processes = 4               # Omit for auto (= CPU cores)
//! time_budget_secs = 30           # Omit for no deadline
//! ```
//!
//! `renditions` is replaced as a whole when overridden; tables are merged
//! key-by-key. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default file name looked up in the content root.
pub const CONFIG_FILENAME: &str = "pipeline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Immutable settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Named target sizes, smallest first.
    pub renditions: Vec<RenditionSpec>,
    pub encoding: EncodingConfig,
    pub manifest: ManifestConfig,
    pub processing: ProcessingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            renditions: vec![
                RenditionSpec::new("thumb", 400),
                RenditionSpec::new("medium", 800),
                RenditionSpec::new("large", 1200),
                RenditionSpec::new("xlarge", 2000),
            ],
            encoding: EncodingConfig::default(),
            manifest: ManifestConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renditions.is_empty() {
            return Err(ConfigError::Validation(
                "renditions must not be empty".into(),
            ));
        }
        let mut previous: Option<&RenditionSpec> = None;
        for spec in &self.renditions {
            if spec.name.is_empty()
                || spec.name == "."
                || spec.name == ".."
                || spec.name.contains(['/', '\\'])
            {
                return Err(ConfigError::Validation(format!(
                    "rendition name {:?} is not a valid directory name",
                    spec.name
                )));
            }
            if spec.bound == 0 {
                return Err(ConfigError::Validation(format!(
                    "rendition {} must have a non-zero bound",
                    spec.name
                )));
            }
            if self
                .renditions
                .iter()
                .filter(|other| other.name == spec.name)
                .count()
                > 1
            {
                return Err(ConfigError::Validation(format!(
                    "rendition name {} is declared twice",
                    spec.name
                )));
            }
            if let Some(prev) = previous
                && prev.bound >= spec.bound
            {
                return Err(ConfigError::Validation(format!(
                    "renditions must be ordered by ascending bound ({} >= {})",
                    prev.name, spec.name
                )));
            }
            previous = Some(spec);
        }
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.processing.time_budget_secs == Some(0) {
            return Err(ConfigError::Validation(
                "processing.time_budget_secs must be positive (omit it for no deadline)".into(),
            ));
        }
        Ok(())
    }

    /// The smallest rendition, whose output doubles as the idempotence marker.
    pub fn marker_rendition(&self) -> Option<&RenditionSpec> {
        self.renditions.first()
    }

    /// Wall-clock budget for one processing call, if any.
    pub fn time_budget(&self) -> Option<Duration> {
        self.processing.time_budget_secs.map(Duration::from_secs)
    }
}

/// One named target size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenditionSpec {
    /// Directory name under `sizes/` and the key used in manifests.
    pub name: String,
    /// Maximum length of the longer edge, in pixels.
    pub bound: u32,
}

impl RenditionSpec {
    pub fn new(name: impl Into<String>, bound: u32) -> Self {
        Self {
            name: name.into(),
            bound,
        }
    }
}

/// Encoder settings shared by every rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// JPEG/WebP quality (1 = worst, 100 = best). PNG output is lossless.
    pub quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { quality: 85 }
    }
}

/// Manifest (srcset) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Public URL path under which project directories are served.
    pub url_prefix: String,
    /// Fixed `sizes` attribute emitted with every manifest entry.
    pub sizes_hint: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/workshops".to_string(),
            sizes_hint: "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 33vw".to_string(),
        }
    }
}

/// How a source file is judged to be already processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipPolicy {
    /// Skip only when every rendition exists; derive the missing ones otherwise.
    #[default]
    PerRendition,
    /// Skip as soon as the smallest rendition exists.
    Marker,
}

/// Parallelism and deadline settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    pub skip_policy: SkipPolicy,
    /// Maximum number of projects processed concurrently.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Deadline for a whole processing call, in seconds. Files not started
    /// before the deadline are reported as deferred.
    pub time_budget_secs: Option<u64>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(config_path: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pipeline.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Portfolio media pipeline configuration
# =====================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Renditions
# ---------------------------------------------------------------------------
# One entry per target size, ordered smallest to largest. Each rendition is
# written to <project>/sizes/<name>/<filename>; `bound` is the maximum length
# of the longer edge in pixels. Sources already within the bound are copied
# byte-for-byte instead of being re-encoded. Overriding this list replaces it.

[[renditions]]
name = "thumb"
bound = 400

[[renditions]]
name = "medium"
bound = 800

[[renditions]]
name = "large"
bound = 1200

[[renditions]]
name = "xlarge"
bound = 2000

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG and WebP quality (1 = worst, 100 = best). PNG output is always lossless.
quality = 85

# ---------------------------------------------------------------------------
# Manifest
# ---------------------------------------------------------------------------
[manifest]
# Public URL path under which project directories are served.
url_prefix = "/workshops"

# `sizes` attribute attached to every manifest entry.
sizes_hint = "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 33vw"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# "per-rendition": a file is skipped only when every rendition exists;
#                  missing renditions are derived on the next run.
# "marker":        a file is skipped as soon as the smallest rendition exists.
skip_policy = "per-rendition"

# Maximum projects processed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Deadline for a processing call, in seconds. Files not started in time are
# reported as deferred and picked up by the next run.
# time_budget_secs = 30
"##
}
