//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate decoders, format pinned by extension |
//! | Orientation tag | `ImageDecoder::orientation` (JPEG EXIF) |
//! | Orientation correction | `DynamicImage::{rotate90, rotate180, rotate270, fliph, flipv}` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, alpha kept) |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::format::SourceFormat;
use super::orientation::Orientation;
use super::params::{Quality, RenderParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path, format: SourceFormat) -> Result<ImageReader<BufReader<File>>, BackendError> {
    let mut reader = ImageReader::open(path)?;
    reader.set_format(format.image_format());
    Ok(reader)
}

/// Load and decode an image from disk.
fn load_image(path: &Path, format: SourceFormat) -> Result<DynamicImage, BackendError> {
    open_reader(path, format)?
        .decode()
        .map_err(|e| BackendError::Decode {
            format,
            message: format!("{}: {}", path.display(), e),
        })
}

/// Encode `img` in `format` and write it to `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: SourceFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let encode_err = |e: image::ImageError| BackendError::Encode {
        format,
        message: e.to_string(),
    };

    match format {
        SourceFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut writer, quality.value() as u8)
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(encode_err)?;
            writer.flush()?;
        }
        SourceFormat::Png => {
            let mut writer = BufWriter::new(File::create(path)?);
            img.write_with_encoder(PngEncoder::new(&mut writer))
                .map_err(encode_err)?;
            writer.flush()?;
        }
        SourceFormat::WebP => {
            let (width, height) = (img.width(), img.height());
            let encoded = if img.color().has_alpha() {
                let rgba = img.to_rgba8();
                webp::Encoder::from_rgba(&rgba, width, height).encode(quality.value() as f32)
            } else {
                let rgb = img.to_rgb8();
                webp::Encoder::from_rgb(&rgb, width, height).encode(quality.value() as f32)
            };
            std::fs::write(path, &*encoded)?;
        }
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path, format: SourceFormat) -> Result<Dimensions, BackendError> {
        let (width, height) =
            open_reader(path, format)?
                .into_dimensions()
                .map_err(|e| BackendError::Decode {
                    format,
                    message: format!("{}: {}", path.display(), e),
                })?;
        Ok(Dimensions { width, height })
    }

    fn read_orientation(&self, path: &Path, format: SourceFormat) -> Option<Orientation> {
        if !format.reads_orientation() {
            return None;
        }
        let decoded = open_reader(path, format)
            .ok()
            .and_then(|reader| reader.into_decoder().ok())
            .and_then(|mut decoder| decoder.orientation().ok());
        match decoded.map(Orientation::from_decoded) {
            Some(Orientation::Normal) | None => None,
            oriented => oriented,
        }
    }

    fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
        let img = load_image(&params.source, params.format)?;
        let img = match params.orientation {
            Some(orientation) => orientation.apply(img),
            None => img,
        };

        for target in &params.targets {
            let resized = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
            save_image(&resized, &target.output, params.format, params.quality)?;
        }
        Ok(())
    }
}
