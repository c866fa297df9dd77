//! Directory-driven rendition pipeline.
//!
//! For every source image in a project directory:
//!
//! 1. **Skip check**: existing renditions under `sizes/` decide whether the
//!    file is already processed (see [`SkipPolicy`]).
//! 2. **Plan**: identify, read the orientation tag (JPEG only), and choose
//!    copy or resize per rendition. Nothing is ever upscaled.
//! 3. **Derive**: one decode, one orientation correction, every resize; then
//!    verbatim copies for renditions the source already fits.
//! 4. **Archive**: rename the source into `originals/`.
//!
//! ## Output Structure
//!
//! ```text
//! <project>/
//! ├── sizes/
//! │   ├── thumb/IMG_0001.jpg       # ≤400px on the longer edge
//! │   ├── medium/IMG_0001.jpg      # ≤800px
//! │   ├── large/IMG_0001.jpg       # ≤1200px
//! │   └── xlarge/IMG_0001.jpg      # ≤2000px
//! └── originals/
//!     └── IMG_0001.jpg             # Source, moved (not copied)
//! ```
//!
//! The rendition files themselves are the only persisted state; there is no
//! separate ledger. Rerunning is cheap: processed files cost one `stat` per
//! rendition and are never rewritten.
//!
//! ## Failure Isolation
//!
//! A file that cannot be decoded, resized or written is recorded in
//! [`ProcessingResult::errors`] and the loop moves on. Only a missing project
//! directory (or one whose managed directories cannot be created) fails the
//! whole call. A failed archive rename is not an error: the renditions are
//! complete, the source simply stays where it was.
//!
//! ## Parallel Processing
//!
//! [`Pipeline::process_all_projects`] fans out across projects with
//! [rayon](https://docs.rs/rayon); each project only writes inside its own
//! subtree. Files within a project are processed in order.
//!
//! Two concurrent calls on the *same* project race on the skip check. Callers
//! must not do that.

use crate::config::{PipelineConfig, SkipPolicy};
use crate::imaging::{
    ImageBackend, Quality, RenditionJob, RenditionPlan, RustBackend, derive_renditions, plan_image,
};
use crate::scan::{self, ScanError, SourceImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Project directory not found")]
    ProjectNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// Outcome of one processing call on one project.
///
/// Every scanned file lands in exactly one of `processed`, `skipped`,
/// `deferred` or `errors`. `moved_to_originals` is the subset of `processed`
/// whose source was archived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub processed: Vec<String>,
    pub moved_to_originals: Vec<String>,
    /// Already processed on an earlier run; nothing was written.
    pub skipped: Vec<String>,
    /// Not started before the time budget ran out; picked up next run.
    pub deferred: Vec<String>,
    pub errors: Vec<FileError>,
}

/// A per-file failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub filename: String,
    pub error: String,
}

/// Per-project entry of [`Pipeline::process_all_projects`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProjectOutcome {
    Processed(ProcessingResult),
    Failed { error: String },
}

/// How one rendition of one file was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionStatus {
    /// Present from an earlier run, left untouched.
    Existing,
    /// Source already fit; original bytes copied.
    Copied,
    /// Resampled and re-encoded.
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionInfo {
    pub name: String,
    pub status: RenditionStatus,
}

/// Progress events, sent as work completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    ProjectStarted {
        project: String,
        image_count: usize,
    },
    ImageProcessed {
        /// 1-based position within the project's scan order.
        index: usize,
        filename: String,
        renditions: Vec<RenditionInfo>,
        moved_original: bool,
    },
    ImageSkipped {
        index: usize,
        filename: String,
    },
    ImageFailed {
        index: usize,
        filename: String,
        error: String,
    },
    Deferred {
        project: String,
        count: usize,
    },
}

enum FileOutcome {
    Skipped,
    Processed {
        renditions: Vec<RenditionInfo>,
        moved_original: bool,
    },
    Failed(String),
}

/// The image pipeline bound to one content root and one configuration.
pub struct Pipeline<B: ImageBackend = RustBackend> {
    root: PathBuf,
    config: PipelineConfig,
    backend: B,
}

impl Pipeline<RustBackend> {
    pub fn new(root: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self::with_backend(root, config, RustBackend::new())
    }
}

impl<B: ImageBackend> Pipeline<B> {
    /// Build a pipeline around a specific backend (allows testing with mock).
    pub fn with_backend(root: impl Into<PathBuf>, config: PipelineConfig, backend: B) -> Self {
        Self {
            root: root.into(),
            config,
            backend,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Process every project under the root, in parallel.
    ///
    /// A missing root yields an empty map. Hidden directories are not projects.
    pub fn process_all_projects(
        &self,
        events: Option<Sender<ProcessEvent>>,
    ) -> BTreeMap<String, ProjectOutcome> {
        let deadline = self.deadline();
        let projects = match scan::list_projects(&self.root) {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "cannot list projects");
                return BTreeMap::new();
            }
        };

        projects
            .into_par_iter()
            .map(|name| {
                let outcome = match self.process_project_until(&name, deadline, events.as_ref()) {
                    Ok(result) => ProjectOutcome::Processed(result),
                    Err(e) => ProjectOutcome::Failed {
                        error: e.to_string(),
                    },
                };
                (name, outcome)
            })
            .collect()
    }

    /// Process one project by directory name.
    pub fn process_project(
        &self,
        name: &str,
        events: Option<Sender<ProcessEvent>>,
    ) -> Result<ProcessingResult, ProcessError> {
        self.process_project_until(name, self.deadline(), events.as_ref())
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.time_budget().map(|budget| Instant::now() + budget)
    }

    fn process_project_until(
        &self,
        name: &str,
        deadline: Option<Instant>,
        events: Option<&Sender<ProcessEvent>>,
    ) -> Result<ProcessingResult, ProcessError> {
        let project_dir = scan::project_dir(&self.root, name)
            .ok_or_else(|| ProcessError::ProjectNotFound(name.to_string()))?;

        self.create_managed_dirs(&project_dir)?;
        let images = scan::scan_project(&project_dir)?;

        tracing::info!(project = name, images = images.len(), "processing project");
        emit(
            events,
            ProcessEvent::ProjectStarted {
                project: name.to_string(),
                image_count: images.len(),
            },
        );

        let mut result = ProcessingResult::default();
        for (i, image) in images.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                result.deferred = images[i..].iter().map(|img| img.filename.clone()).collect();
                tracing::warn!(
                    project = name,
                    deferred = result.deferred.len(),
                    "time budget exhausted"
                );
                emit(
                    events,
                    ProcessEvent::Deferred {
                        project: name.to_string(),
                        count: result.deferred.len(),
                    },
                );
                break;
            }

            let index = i + 1;
            let filename = image.filename.clone();
            match self.process_file(&project_dir, image) {
                FileOutcome::Skipped => {
                    tracing::debug!(project = name, file = %filename, "already processed");
                    result.skipped.push(filename.clone());
                    emit(events, ProcessEvent::ImageSkipped { index, filename });
                }
                FileOutcome::Processed {
                    renditions,
                    moved_original,
                } => {
                    tracing::info!(project = name, file = %filename, moved_original, "processed");
                    result.processed.push(filename.clone());
                    if moved_original {
                        result.moved_to_originals.push(filename.clone());
                    }
                    emit(
                        events,
                        ProcessEvent::ImageProcessed {
                            index,
                            filename,
                            renditions,
                            moved_original,
                        },
                    );
                }
                FileOutcome::Failed(error) => {
                    tracing::warn!(project = name, file = %filename, error = %error, "failed");
                    result.errors.push(FileError {
                        filename: filename.clone(),
                        error: error.clone(),
                    });
                    emit(
                        events,
                        ProcessEvent::ImageFailed {
                            index,
                            filename,
                            error,
                        },
                    );
                }
            }
        }

        Ok(result)
    }

    fn create_managed_dirs(&self, project_dir: &Path) -> std::io::Result<()> {
        for spec in &self.config.renditions {
            fs::create_dir_all(scan::rendition_dir(project_dir, &spec.name))?;
        }
        fs::create_dir_all(scan::originals_dir(project_dir))
    }

    fn process_file(&self, project_dir: &Path, image: &SourceImage) -> FileOutcome {
        let outputs: Vec<(&crate::config::RenditionSpec, PathBuf)> = self
            .config
            .renditions
            .iter()
            .map(|spec| {
                (
                    spec,
                    scan::rendition_dir(project_dir, &spec.name).join(&image.filename),
                )
            })
            .collect();

        let already_processed = match self.config.processing.skip_policy {
            SkipPolicy::Marker => outputs.first().is_some_and(|(_, path)| path.exists()),
            SkipPolicy::PerRendition => outputs.iter().all(|(_, path)| path.exists()),
        };
        if already_processed {
            return FileOutcome::Skipped;
        }

        let mut renditions = Vec::with_capacity(outputs.len());
        let mut jobs = Vec::new();
        for (spec, output) in outputs {
            if output.exists() {
                renditions.push(RenditionInfo {
                    name: spec.name.clone(),
                    status: RenditionStatus::Existing,
                });
            } else {
                jobs.push(RenditionJob {
                    name: spec.name.clone(),
                    bound: spec.bound,
                    output,
                });
            }
        }

        let plan = match plan_image(&self.backend, &image.path, image.format, jobs) {
            Ok(plan) => plan,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };
        tracing::debug!(
            file = %image.filename,
            oriented = ?plan.oriented,
            resizes = plan.resize_count(),
            copies = plan.renditions.len() - plan.resize_count(),
            "planned renditions"
        );
        let quality = Quality::new(self.config.encoding.quality);
        if let Err(e) = derive_renditions(&self.backend, &plan, quality) {
            return FileOutcome::Failed(e.to_string());
        }

        for planned in &plan.renditions {
            renditions.push(RenditionInfo {
                name: planned.job.name.clone(),
                status: match planned.plan {
                    RenditionPlan::Copy => RenditionStatus::Copied,
                    RenditionPlan::Resize { .. } => RenditionStatus::Encoded,
                },
            });
        }
        // Report in configured order regardless of which were derived
        renditions.sort_by_key(|info| {
            self.config
                .renditions
                .iter()
                .position(|spec| spec.name == info.name)
        });

        let moved_original = archive_original(project_dir, image);
        FileOutcome::Processed {
            renditions,
            moved_original,
        }
    }
}

/// Move the source into `originals/`. Returns whether it moved.
///
/// Never overwrites an archived file of the same name; the source then stays
/// in place so exactly one copy of each original survives.
fn archive_original(project_dir: &Path, image: &SourceImage) -> bool {
    let destination = scan::originals_dir(project_dir).join(&image.filename);
    if destination.exists() {
        tracing::warn!(
            file = %image.filename,
            "an archived original with this name already exists; leaving source in place"
        );
        return false;
    }
    match fs::rename(&image.path, &destination) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(file = %image.filename, error = %e, "could not archive original");
            false
        }
    }
}

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is listening; processing carries on.
        let _ = tx.send(event);
    }
}
