//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides which
//! renditions need pixels) and the [`backend`](super::backend) (which decodes,
//! corrects, resamples and encodes).
//!
//! - [`Quality`]: lossy encoding quality (1-100, default 85). Clamped on construction.
//! - [`RenditionTarget`]: one output file at exact dimensions.
//! - [`RenderParams`]: one source, decoded once, written to every target.

use super::format::SourceFormat;
use super::orientation::Orientation;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// A single resampled output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Everything needed to render one source into several sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    /// Decoder and encoder are both chosen from this.
    pub format: SourceFormat,
    /// Correction applied once, before any resampling.
    pub orientation: Option<Orientation>,
    pub quality: Quality,
    pub targets: Vec<RenditionTarget>,
}
