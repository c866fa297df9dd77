//! Orientation correction.
//!
//! | Code | Correction |
//! |---|---|
//! | 1 | identity |
//! | 2 | flip horizontal |
//! | 3 | rotate 180° |
//! | 4 | flip vertical |
//! | 5 | rotate 90° counter-clockwise, then flip horizontal |
//! | 6 | rotate 90° clockwise |
//! | 7 | rotate 90° clockwise, then flip horizontal |
//! | 8 | rotate 90° counter-clockwise |
//!
//! [`Orientation::apply`] takes the decoded bitmap by value and hands back the
//! corrected one; callers never see a half-transformed image.

use image::DynamicImage;
use image::metadata::Orientation as DecodedOrientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Rotate270FlipHorizontal,
    Rotate90,
    Rotate90FlipHorizontal,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value. Anything outside 1-8 is treated as absent.
    pub fn from_exif(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Rotate270FlipHorizontal),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Rotate90FlipHorizontal),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// Map the orientation reported by an `image` decoder.
    ///
    /// Goes through the EXIF code so codes 5 and 7 keep this module's table.
    pub fn from_decoded(decoded: DecodedOrientation) -> Self {
        let code = match decoded {
            DecodedOrientation::NoTransforms => 1,
            DecodedOrientation::FlipHorizontal => 2,
            DecodedOrientation::Rotate180 => 3,
            DecodedOrientation::FlipVertical => 4,
            DecodedOrientation::Rotate90FlipH => 5,
            DecodedOrientation::Rotate90 => 6,
            DecodedOrientation::Rotate270FlipH => 7,
            DecodedOrientation::Rotate270 => 8,
        };
        Self::from_exif(code).unwrap_or(Self::Normal)
    }

    pub fn exif_code(self) -> u16 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Rotate270FlipHorizontal => 5,
            Self::Rotate90 => 6,
            Self::Rotate90FlipHorizontal => 7,
            Self::Rotate270 => 8,
        }
    }

    /// True for the quarter-turn codes (5-8), which swap width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Rotate270FlipHorizontal
                | Self::Rotate90
                | Self::Rotate90FlipHorizontal
                | Self::Rotate270
        )
    }

    /// Dimensions of the bitmap after correction.
    pub fn oriented_dimensions(self, (width, height): (u32, u32)) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Apply the correction, consuming the source bitmap.
    ///
    /// Pixel format (including any alpha channel) is preserved.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Rotate270FlipHorizontal => img.rotate270().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Rotate90FlipHorizontal => img.rotate90().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}
