//! Raster output of the two code encoders

use image::GrayImage;

/// Pixel value for bars and dark modules
pub const INK: u8 = 0;

/// Pixel value for spaces, light modules and quiet zones
pub const PAPER: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// QR code carrying the tracking URL
    Matrix,
    /// Code 128 barcode carrying the tracking id
    Barcode,
}

/// A code image plus the text it encodes
///
/// The image is a pure function of `payload` and the encoder parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArtifact {
    pub kind: ArtifactKind,
    pub payload: String,
    pub image: GrayImage,
}

impl EncodedArtifact {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
