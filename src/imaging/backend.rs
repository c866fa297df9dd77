//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, read_orientation, and render.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate plus `webp` for lossy WebP output.

use super::format::SourceFormat;
use super::orientation::Orientation;
use super::params::RenderParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {format} image: {message}")]
    Decode {
        format: SourceFormat,
        message: String,
    },
    #[error("Failed to encode {format} image: {message}")]
    Encode {
        format: SourceFormat,
        message: String,
    },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Every backend implements all three operations so the pipeline stays
/// backend-agnostic and can run against [`tests::MockBackend`].
pub trait ImageBackend: Sync {
    /// Get stored image dimensions, before any orientation correction.
    fn identify(&self, path: &Path, format: SourceFormat) -> Result<Dimensions, BackendError>;

    /// Read the orientation tag. Unreadable metadata is `None`, never an error.
    fn read_orientation(&self, path: &Path, format: SourceFormat) -> Option<Orientation>;

    /// Decode the source once, correct orientation, and write every target.
    fn render(&self, params: &RenderParams) -> Result<(), BackendError>;
}
