//! QR matrix code encoding
//!
//! Encodes the tracking URL into a fixed-size square grayscale raster.
//!
//! **Design**:
//! - Error correction level M, 1-module margin, black on white
//! - Integer module scale; the symbol is centred in the fixed square and
//!   the leftover pixels stay white
//! - Identical payload and parameters give a byte-identical image

use crate::artifact::{ArtifactKind, EncodedArtifact, INK, PAPER};
use crate::error::{LabelError, Result};
use image::{GrayImage, Luma};
use qrcode::types::{Color, QrError};
use qrcode::{EcLevel, QrCode};
use tracing::debug;

/// Matrix encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixParams {
    /// Side length of the square output image in pixels
    pub size_px: u32,

    /// Light border around the symbol, in modules
    pub margin_modules: u32,

    pub ec_level: EcLevel,
}

impl Default for MatrixParams {
    fn default() -> Self {
        MatrixParams {
            size_px: 256,
            margin_modules: 1,
            ec_level: EcLevel::M,
        }
    }
}

/// Encodes tracking URLs as QR codes
#[derive(Debug, Clone, Default)]
pub struct MatrixEncoder {
    params: MatrixParams,
}

impl MatrixEncoder {
    pub fn new(params: MatrixParams) -> Self {
        MatrixEncoder { params }
    }

    pub fn params(&self) -> &MatrixParams {
        &self.params
    }

    /// Encode a payload into a square raster
    ///
    /// # Errors
    ///
    /// Returns `Encoding` when the payload is beyond QR capacity at the
    /// configured error-correction level, or when the resulting symbol has
    /// more modules than the image has pixels.
    pub fn encode(&self, payload: &str) -> Result<EncodedArtifact> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.params.ec_level)
            .map_err(|e| match e {
                QrError::DataTooLong => LabelError::Encoding(format!(
                    "tracking URL is {} bytes, beyond QR capacity at level {:?}; use a shorter redirect URL",
                    payload.len(),
                    self.params.ec_level
                )),
                other => LabelError::Encoding(format!("QR encoding failed: {}", other)),
            })?;

        let modules = code.width() as u32;
        let span = modules + 2 * self.params.margin_modules;
        let scale = self.params.size_px / span;
        if scale == 0 {
            return Err(LabelError::Encoding(format!(
                "QR symbol needs {} modules but the image is only {} px wide",
                span, self.params.size_px
            )));
        }

        let origin = (self.params.size_px - scale * span) / 2 + self.params.margin_modules * scale;
        debug!(
            "QR symbol: {} modules, scale {} px, origin {} px",
            modules, scale, origin
        );

        let side = self.params.size_px;
        let mut image = GrayImage::from_pixel(side, side, Luma([PAPER]));
        for (index, color) in code.to_colors().into_iter().enumerate() {
            if color != Color::Dark {
                continue;
            }
            let mx = index as u32 % modules;
            let my = index as u32 / modules;
            fill_square(&mut image, origin + mx * scale, origin + my * scale, scale);
        }

        Ok(EncodedArtifact {
            kind: ArtifactKind::Matrix,
            payload: payload.to_string(),
            image,
        })
    }
}

fn fill_square(image: &mut GrayImage, x0: u32, y0: u32, side: u32) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            image.put_pixel(x, y, Luma([INK]));
        }
    }
}
