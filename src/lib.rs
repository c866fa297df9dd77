//! # Portfolio Media
//!
//! The image side of a flat-file portfolio site. Each project is a directory of
//! photos under a content root; this crate turns uploaded photos into a fixed
//! set of bounded renditions, archives the originals, and answers
//! "which images exist at which sizes" for page rendering.
//!
//! # Architecture
//!
//! ```text
//! workshops/<project>/IMG.jpg
//!        │  process
//!        ▼
//! workshops/<project>/sizes/{thumb,medium,large,xlarge}/IMG.jpg
//! workshops/<project>/originals/IMG.jpg
//!        │  manifest (read-only)
//!        ▼
//! { "<project>": [{ filename, srcset, sizes }] }
//! ```
//!
//! The filesystem is the only state. A file counts as processed when its
//! renditions exist, so processing is safe to rerun at any time and never
//! writes anything for work that is already done.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `pipeline.toml` loading, defaults, validation |
//! | [`scan`] | Project and source-image discovery |
//! | [`imaging`] | Decode, EXIF orientation, bounded resize, encode |
//! | [`process`] | The [`process::Pipeline`]: skip check, derive, archive |
//! | [`manifest`] | Responsive-image `srcset` records per project |
//! | [`metadata`] | `project.yaml` / `metadata.yaml` sidecars |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Upscaling, No Re-encoding When It Fits
//!
//! A rendition whose bound is at least the source's longer edge is the
//! original file, byte for byte. Small uploads never get blurrier or larger.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and resampling use the `image` crate (Lanczos3); lossy WebP
//! encoding uses `webp`. No ImageMagick, no shelling out.
//!
//! ## Atomic Renditions
//!
//! Renditions are written to a hidden `.partial` sibling and renamed into
//! place. An interrupted run can't leave a truncated file that would later
//! pass for a finished one.

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;

pub use config::PipelineConfig;
pub use process::{Pipeline, ProcessingResult};
