//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they plan
//! every rendition of one source ([`plan_image`]) and then produce the files
//! ([`derive_renditions`]). Every output is first written to a hidden
//! `.<name>.partial` sibling and renamed into place, so a rendition path
//! either holds a complete file or nothing.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{RenditionPlan, plan_rendition};
use super::format::SourceFormat;
use super::orientation::Orientation;
use super::params::{Quality, RenderParams, RenditionTarget};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// One rendition requested for a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionJob {
    pub name: String,
    pub bound: u32,
    pub output: PathBuf,
}

/// A job paired with its copy-or-resize decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRendition {
    pub job: RenditionJob,
    pub plan: RenditionPlan,
}

/// Everything decided about one source before any file is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlan {
    pub source: PathBuf,
    pub format: SourceFormat,
    /// Correction to apply; `None` when absent, unreadable or identity.
    pub orientation: Option<Orientation>,
    /// Dimensions after orientation correction.
    pub oriented: (u32, u32),
    pub renditions: Vec<PlannedRendition>,
}

impl ImagePlan {
    pub fn resize_count(&self) -> usize {
        self.renditions
            .iter()
            .filter(|r| matches!(r.plan, RenditionPlan::Resize { .. }))
            .count()
    }
}

/// Hidden temporary path next to `output`, used until the write completes.
pub fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

/// Identify the source, read its orientation, and plan each job.
///
/// Fails only when the source cannot be identified (missing, corrupt, or
/// not actually in `format`).
pub fn plan_image(
    backend: &impl ImageBackend,
    source: &Path,
    format: SourceFormat,
    jobs: Vec<RenditionJob>,
) -> Result<ImagePlan> {
    let stored = backend.identify(source, format)?.as_tuple();

    let orientation = if format.reads_orientation() {
        backend
            .read_orientation(source, format)
            .filter(|o| *o != Orientation::Normal)
    } else {
        None
    };
    let oriented = orientation
        .map(|o| o.oriented_dimensions(stored))
        .unwrap_or(stored);

    let renditions = jobs
        .into_iter()
        .map(|job| PlannedRendition {
            plan: plan_rendition(oriented, job.bound),
            job,
        })
        .collect();

    Ok(ImagePlan {
        source: source.to_path_buf(),
        format,
        orientation,
        oriented,
        renditions,
    })
}

/// Write every planned rendition.
///
/// Resized renditions are rendered first, from a single decode. Copies follow.
/// On failure all partial files are removed and no rendition written by this
/// call is left half-finished.
pub fn derive_renditions(
    backend: &impl ImageBackend,
    plan: &ImagePlan,
    quality: Quality,
) -> Result<()> {
    let mut targets = Vec::new();
    let mut pending = Vec::new();
    for planned in &plan.renditions {
        if let RenditionPlan::Resize { width, height } = planned.plan {
            let partial = partial_path(&planned.job.output);
            tracing::debug!(
                source = %plan.source.display(),
                rendition = %planned.job.name,
                width,
                height,
                "resizing"
            );
            targets.push(RenditionTarget {
                output: partial.clone(),
                width,
                height,
            });
            pending.push((partial, planned.job.output.clone()));
        }
    }

    if !targets.is_empty() {
        let params = RenderParams {
            source: plan.source.clone(),
            format: plan.format,
            orientation: plan.orientation,
            quality,
            targets,
        };
        if let Err(e) = backend.render(&params) {
            discard(pending.iter().map(|(partial, _)| partial));
            return Err(e);
        }
    }

    for planned in &plan.renditions {
        if planned.plan == RenditionPlan::Copy {
            tracing::debug!(
                source = %plan.source.display(),
                rendition = %planned.job.name,
                "within bound, copying original bytes"
            );
            let partial = partial_path(&planned.job.output);
            let copied = fs::copy(&plan.source, &partial);
            pending.push((partial, planned.job.output.clone()));
            if let Err(e) = copied {
                discard(pending.iter().map(|(partial, _)| partial));
                return Err(e.into());
            }
        }
    }

    for (i, (partial, output)) in pending.iter().enumerate() {
        if let Err(e) = fs::rename(partial, output) {
            discard(pending[i..].iter().map(|(partial, _)| partial));
            return Err(e.into());
        }
    }
    Ok(())
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}
