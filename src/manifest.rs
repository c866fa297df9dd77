//! Responsive-image manifest.
//!
//! A read-only query over already-processed projects. For every project whose
//! smallest rendition directory holds at least one image, lists each file with
//! a `srcset` covering the renditions that exist on disk:
//!
//! ```json
//! {
//!   "birdhouse": [
//!     {
//!       "filename": "IMG_0001.jpg",
//!       "srcset": "/workshops/birdhouse/sizes/thumb/IMG_0001.jpg 400w, /workshops/birdhouse/sizes/large/IMG_0001.jpg 1200w",
//!       "sizes": "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 33vw"
//!     }
//!   ]
//! }
//! ```
//!
//! Each `srcset` candidate uses the rendition's bound as its width descriptor,
//! in configured (ascending) order. Building a manifest never triggers
//! processing.

use crate::config::PipelineConfig;
use crate::scan::{self, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub srcset: String,
    pub sizes: String,
}

/// Project name → entries, both sorted by name.
pub type Manifest = BTreeMap<String, Vec<ManifestEntry>>;

/// Public URL of one rendition file.
pub fn rendition_url(url_prefix: &str, project: &str, rendition: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        url_prefix.trim_end_matches('/'),
        project,
        scan::SIZES_DIR,
        rendition,
        filename
    )
}

/// `srcset` value for one file: every existing rendition, smallest first.
pub fn generate_srcset(
    root: &Path,
    project: &str,
    filename: &str,
    config: &PipelineConfig,
) -> String {
    let project_dir = root.join(project);
    config
        .renditions
        .iter()
        .filter(|spec| {
            scan::rendition_dir(&project_dir, &spec.name)
                .join(filename)
                .is_file()
        })
        .map(|spec| {
            format!(
                "{} {}w",
                rendition_url(&config.manifest.url_prefix, project, &spec.name, filename),
                spec.bound
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Entries for one project, in file-name order. Empty when nothing is processed.
pub fn project_entries(
    root: &Path,
    project: &str,
    config: &PipelineConfig,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let Some(marker) = config.marker_rendition() else {
        return Ok(Vec::new());
    };
    let files = scan::list_rendition_files(&root.join(project), &marker.name)?;
    Ok(files
        .into_iter()
        .map(|filename| ManifestEntry {
            srcset: generate_srcset(root, project, &filename, config),
            sizes: config.manifest.sizes_hint.clone(),
            filename,
        })
        .collect())
}

/// Manifest for every project under `root`. A missing root yields an empty map.
pub fn build_manifest(root: &Path, config: &PipelineConfig) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::new();
    for project in scan::list_projects(root)? {
        let entries = project_entries(root, &project, config)?;
        if !entries.is_empty() {
            manifest.insert(project, entries);
        }
    }
    Ok(manifest)
}

impl<B: crate::imaging::ImageBackend> crate::process::Pipeline<B> {
    /// See [`build_manifest`].
    pub fn build_manifest(&self) -> Result<Manifest, ManifestError> {
        build_manifest(self.root(), self.config())
    }
}
