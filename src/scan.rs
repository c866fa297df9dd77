//! Filesystem scanning.
//!
//! Discovers projects under the content root and source images inside a
//! project. Pure reads; nothing here creates or moves files.
//!
//! ## Directory Structure
//!
//! ```text
//! workshops/                       # Content root
//! ├── pipeline.toml                # Pipeline configuration (optional)
//! ├── birdhouse/                   # Project
//! │   ├── project.yaml             # Metadata sidecar (ignored here)
//! │   ├── IMG_0001.jpg             # Unprocessed source
//! │   ├── sizes/                   # Managed: one directory per rendition
//! │   │   ├── thumb/IMG_0002.jpg
//! │   │   └── ...
//! │   └── originals/               # Managed: archived sources
//! │       └── IMG_0002.jpg
//! └── .drafts/                     # Hidden: never a project
//! ```
//!
//! ## Rules
//!
//! - Only regular files directly inside the project directory are sources.
//!   `sizes/`, `originals/` and any other subdirectory are never descended.
//! - Symlinks count as whatever they point at; dangling links are skipped.
//! - Extensions are matched case-insensitively against `jpg`, `jpeg`, `png`, `webp`.
//!   Sidecars and everything else are filtered out without error.
//! - Hidden entries (leading `.`) are skipped, which covers in-flight
//!   `.<name>.partial` files.
//! - Results are sorted by file name so runs are deterministic.

use crate::imaging::SourceFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Managed directory holding one subdirectory per rendition.
pub const SIZES_DIR: &str = "sizes";
/// Managed directory holding archived originals.
pub const ORIGINALS_DIR: &str = "originals";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Project directory not found: {0}")]
    NotFound(PathBuf),
}

/// A source image discovered in a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Bare file name; also the name of every rendition and the archived copy.
    pub filename: String,
    pub path: PathBuf,
    pub format: SourceFormat,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Immediate children of `dir`, sorted by file name, hidden entries removed.
fn children(dir: &Path) -> impl Iterator<Item = Result<walkdir::DirEntry, walkdir::Error>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        // The predicate also sees the root itself, which may live under a hidden path
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
}

/// Image files (by extension) directly inside `dir`.
fn image_files(dir: &Path) -> Result<Vec<SourceImage>, ScanError> {
    let mut images = Vec::new();
    for entry in children(dir) {
        let entry = entry?;
        // Path::is_file follows symlinks, DirEntry::file_type does not
        if !entry.path().is_file() {
            continue;
        }
        let path = entry.into_path();
        let Some(format) = SourceFormat::from_path(&path) else {
            continue;
        };
        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        images.push(SourceImage {
            filename,
            path,
            format,
        });
    }
    Ok(images)
}

/// Enumerate candidate source images in a project directory.
///
/// Returns [`ScanError::NotFound`] if `project_dir` is not a directory.
pub fn scan_project(project_dir: &Path) -> Result<Vec<SourceImage>, ScanError> {
    if !project_dir.is_dir() {
        return Err(ScanError::NotFound(project_dir.to_path_buf()));
    }
    image_files(project_dir)
}

/// Resolve a project name given on the command line or by a caller.
///
/// `None` unless `name` is a single visible path component naming an
/// existing directory under `root`.
pub fn project_dir(root: &Path, name: &str) -> Option<PathBuf> {
    let valid = !name.is_empty() && !is_hidden(name) && !name.contains(['/', '\\']);
    Some(root.join(name)).filter(|dir| valid && dir.is_dir())
}

/// Names of all project directories under `root`, sorted.
///
/// A missing root yields an empty list.
pub fn list_projects(root: &Path) -> Result<Vec<String>, ScanError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut projects = Vec::new();
    for entry in children(root) {
        let entry = entry?;
        if entry.path().is_dir() {
            projects.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(projects)
}

/// File names of image files in one rendition directory, sorted.
///
/// A missing directory yields an empty list.
pub fn list_rendition_files(project_dir: &Path, rendition: &str) -> Result<Vec<String>, ScanError> {
    let dir = rendition_dir(project_dir, rendition);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(image_files(&dir)?
        .into_iter()
        .map(|img| img.filename)
        .collect())
}

/// `<project>/sizes/<rendition>`
pub fn rendition_dir(project_dir: &Path, rendition: &str) -> PathBuf {
    project_dir.join(SIZES_DIR).join(rendition)
}

/// `<project>/originals`
pub fn originals_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(ORIGINALS_DIR)
}
