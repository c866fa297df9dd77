//! Image processing: decode, orientation correction, resize, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Orientation tag** | `ImageDecoder::orientation` |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | JPEG/PNG via `image`, lossy WebP via `webp` |
//!
//! The module is split into:
//! - **Format**: the closed set of accepted source formats
//! - **Orientation**: EXIF code table and bitmap correction
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod format;
pub mod operations;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{RenditionPlan, fit_within_bound, plan_rendition};
pub use format::{SUPPORTED_EXTENSIONS, SourceFormat};
pub use operations::{ImagePlan, RenditionJob, derive_renditions, partial_path, plan_image};
pub use orientation::Orientation;
pub use params::{Quality, RenderParams, RenditionTarget};
pub use rust_backend::RustBackend;
