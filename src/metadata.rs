//! Project metadata sidecars.
//!
//! Each project (or photography category) directory may carry a YAML sidecar:
//! `project.yaml` for workshop projects, `metadata.yaml` for categories. The
//! first one found wins. The pipeline never writes or validates these files;
//! this module only turns them into a flat mapping for display code.
//!
//! ```yaml
//! title: Walnut Bench
//! category: furniture
//! hero_image: IMG_0042.jpg
//! estimated_time: 2 weekends
//! nsfw: no
//! materials:
//!   - walnut
//!   - danish oil
//! steps:          # empty value: an empty list
//! ```
//!
//! ## Value model
//!
//! Every value is either text or a list of text:
//!
//! - Scalars (strings, numbers, booleans) become [`MetadataValue::Text`].
//! - Sequences of scalars become [`MetadataValue::List`].
//! - A key with no value becomes an empty list.
//! - Nested mappings are rejected with [`MetadataError::Unsupported`].
//!
//! ## Hand-written sidecars
//!
//! Sidecars are edited by hand and often are not strict YAML
//! (`description: Note: oiled` is a YAML error). When the YAML parser
//! rejects a file it is re-read line by line: `key: value` splits at the
//! first colon, `- item` lines extend the list opened by a bare `key:`.
//! Only a file with no usable `key:` line at all is a parse error.

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sidecar file names, in lookup order.
pub const SIDECAR_NAMES: &[&str] = &["project.yaml", "metadata.yaml"];

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Unsupported value for key '{key}' in {path}: {reason}")]
    Unsupported {
        path: PathBuf,
        key: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

/// Flat key → value mapping read from one sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ProjectMetadata {
    pub fields: BTreeMap<String, MetadataValue>,
}

impl ProjectMetadata {
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.fields.get(key)
    }

    /// Text value of `key`, trimmed; `None` if missing, empty, or a list.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            MetadataValue::Text(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            MetadataValue::List(_) => None,
        }
    }

    /// List value of `key`. A single text value is a one-item list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(MetadataValue::List(items)) => items.clone(),
            Some(MetadataValue::Text(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// `true` for `true`, `1` or `yes` (case-insensitive); otherwise `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.text(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn category(&self) -> Option<&str> {
        self.text("category")
    }
}

/// Load the sidecar of `project_dir`, trying [`SIDECAR_NAMES`] in order.
///
/// Returns `Ok(None)` when no sidecar exists.
pub fn load_project_metadata(project_dir: &Path) -> Result<Option<ProjectMetadata>, MetadataError> {
    for name in SIDECAR_NAMES {
        let path = project_dir.join(name);
        if path.is_file() {
            return load_metadata_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Parse one sidecar file.
pub fn load_metadata_file(path: &Path) -> Result<ProjectMetadata, MetadataError> {
    let content = fs::read_to_string(path)?;
    parse_metadata(&content, path)
}

fn parse_metadata(content: &str, path: &Path) -> Result<ProjectMetadata, MetadataError> {
    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(ProjectMetadata::default());
    }

    let value: Value = match serde_yaml::from_str(content) {
        Ok(value) => value,
        Err(source) => {
            let fields = parse_lines(content);
            if fields.is_empty() {
                return Err(MetadataError::Yaml {
                    path: path.to_path_buf(),
                    source,
                });
            }
            tracing::debug!(
                path = %path.display(),
                error = %source,
                "not strict YAML, read line by line"
            );
            return Ok(ProjectMetadata { fields });
        }
    };

    let unsupported = |key: &str, reason| MetadataError::Unsupported {
        path: path.to_path_buf(),
        key: key.to_string(),
        reason,
    };

    let mapping = match value {
        Value::Null => return Ok(ProjectMetadata::default()),
        Value::Mapping(m) => m,
        _ => return Err(unsupported("", "top level must be a mapping")),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in mapping {
        let key = scalar_text(&key).ok_or_else(|| unsupported("", "keys must be scalars"))?;
        let value = match value {
            Value::Null => MetadataValue::List(Vec::new()),
            Value::Sequence(items) => MetadataValue::List(
                items
                    .iter()
                    .map(|item| {
                        scalar_text(item).ok_or_else(|| unsupported(&key, "list items must be scalars"))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            other => MetadataValue::Text(
                scalar_text(&other).ok_or_else(|| unsupported(&key, "nested mappings are not supported"))?,
            ),
        };
        fields.insert(key, value);
    }
    Ok(ProjectMetadata { fields })
}

/// Line-oriented reading of `key: value` pairs and `- item` lists.
fn parse_lines(content: &str) -> BTreeMap<String, MetadataValue> {
    let unquote = |s: &str| s.trim().trim_matches(['"', '\'']).to_string();

    let mut fields = BTreeMap::new();
    let mut open_list: Option<String> = None;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(item) = line.strip_prefix("- ") {
            if let Some(key) = &open_list
                && let Some(MetadataValue::List(items)) = fields.get_mut(key)
            {
                items.push(unquote(item));
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();
        if value.is_empty() {
            fields.insert(key.clone(), MetadataValue::List(Vec::new()));
            open_list = Some(key);
        } else {
            fields.insert(key, MetadataValue::Text(unquote(value)));
            open_list = None;
        }
    }
    fields
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
