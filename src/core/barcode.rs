//! Code 128 linear barcode
//!
//! Encodes the tracking id into a 1D raster and reads it back.
//!
//! **Symbol layout**:
//!
//! ```text
//! [quiet zone][START B][data symbols...][checksum][STOP][quiet zone]
//! ```
//!
//! - Printable ASCII (32-127) is encoded in code set B
//! - ASCII control characters (0-31) are encoded as SHIFT + code set A
//! - Checksum: (start + sum(value * position)) mod 103, positions from 1
//! - Every symbol is 11 modules wide (3 bars, 3 spaces); STOP is 13
//!
//! The encoder decodes its own output before returning it. The barcode drives
//! inventory deduction on scan, so a raster that does not read back as the
//! exact tracking id is an error, never a label.

use crate::artifact::{ArtifactKind, EncodedArtifact, INK, PAPER};
use crate::error::{LabelError, Result};
use crate::validation::TrackingId;
use image::{GrayImage, Luma};
use tracing::debug;

/// Bar/space widths (in modules) for symbol values 0..=106
const PATTERNS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232", "2331112",
];

const SHIFT: u8 = 98;
const CODE_C: u8 = 99;
const CODE_B: u8 = 100;
const CODE_A: u8 = 101;
const START_A: u8 = 103;
const START_B: u8 = 104;
const START_C: u8 = 105;
const STOP: u8 = 106;

const MODULES_PER_SYMBOL: u32 = 11;
const STOP_MODULES: u32 = 13;
const CHECKSUM_MODULUS: u32 = 103;

/// Barcode encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarcodeParams {
    /// Width of one module in pixels
    pub module_px: u32,

    /// Bar height in pixels
    pub bar_height_px: u32,

    /// Quiet zone on each side, in modules (Code 128 requires at least 10)
    pub quiet_zone_modules: u32,
}

impl Default for BarcodeParams {
    fn default() -> Self {
        BarcodeParams {
            module_px: 2,
            bar_height_px: 100,
            quiet_zone_modules: 10,
        }
    }
}

/// Encodes tracking ids as Code 128 rasters
#[derive(Debug, Clone, Default)]
pub struct BarcodeEncoder {
    params: BarcodeParams,
}

impl BarcodeEncoder {
    pub fn new(params: BarcodeParams) -> Self {
        BarcodeEncoder { params }
    }

    pub fn params(&self) -> &BarcodeParams {
        &self.params
    }

    /// Encode a tracking id
    ///
    /// # Errors
    ///
    /// - `InvalidSymbol` if the id holds a character outside ASCII
    /// - `Encoding` if the rendered raster does not decode back to the id
    pub fn encode(&self, tracking_id: &TrackingId) -> Result<EncodedArtifact> {
        let values = symbol_values(tracking_id.as_str())?;
        let image = self.render(&values);

        let decoded = decode_code128(&image)?;
        if decoded != tracking_id.as_str() {
            return Err(LabelError::Encoding(format!(
                "barcode self-check failed: encoded '{}', read back '{}'",
                tracking_id, decoded
            )));
        }

        debug!(
            "Code 128 for '{}': {} symbols, {}x{} px",
            tracking_id,
            values.len(),
            image.width(),
            image.height()
        );

        Ok(EncodedArtifact {
            kind: ArtifactKind::Barcode,
            payload: tracking_id.as_str().to_string(),
            image,
        })
    }

    fn render(&self, values: &[u8]) -> GrayImage {
        let p = &self.params;
        let symbol_modules = values.len() as u32 * MODULES_PER_SYMBOL + STOP_MODULES;
        let width = (symbol_modules + 2 * p.quiet_zone_modules) * p.module_px;
        let mut image = GrayImage::from_pixel(width, p.bar_height_px, Luma([PAPER]));

        let mut x = p.quiet_zone_modules * p.module_px;
        let stop = std::iter::once(STOP);
        for value in values.iter().copied().chain(stop) {
            for (i, w) in PATTERNS[value as usize].bytes().enumerate() {
                let run = u32::from(w - b'0') * p.module_px;
                if i % 2 == 0 {
                    for bx in x..x + run {
                        for y in 0..p.bar_height_px {
                            image.put_pixel(bx, y, Luma([INK]));
                        }
                    }
                }
                x += run;
            }
        }

        image
    }
}

/// Symbol values for `text`: start code, data, checksum (no stop)
///
/// # Examples
///
/// ```
/// use parcel_slip::core::barcode::symbol_values;
///
/// // START B, 'S', 'C', '-', '4', '2', checksum
/// assert_eq!(symbol_values("SC-42").unwrap(), vec![104, 51, 35, 13, 20, 18, 22]);
/// ```
pub fn symbol_values(text: &str) -> Result<Vec<u8>> {
    let mut values = Vec::with_capacity(text.len() * 2 + 2);
    values.push(START_B);

    for (position, ch) in text.chars().enumerate() {
        if !ch.is_ascii() {
            return Err(LabelError::InvalidSymbol {
                ch,
                position,
                id: text.to_string(),
            });
        }
        let byte = ch as u8;
        if byte < 32 {
            values.push(SHIFT);
            values.push(byte + 64);
        } else {
            values.push(byte - 32);
        }
    }

    values.push(checksum(&values));
    Ok(values)
}

fn checksum(values: &[u8]) -> u8 {
    let sum = values
        .iter()
        .enumerate()
        .map(|(i, &v)| u32::from(v) * (i as u32).max(1))
        .sum::<u32>();
    (sum % CHECKSUM_MODULUS) as u8
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Read a Code 128 raster back to text
///
/// Scans the middle row, derives the module width from the start symbol and
/// verifies the start code, checksum and stop pattern. Supports code sets
/// A, B and C with SHIFT and code switches; function codes are rejected.
pub fn decode_code128(image: &GrayImage) -> Result<String> {
    let fail = |msg: &str| LabelError::Encoding(format!("Code 128 decode failed: {}", msg));

    if image.height() == 0 {
        return Err(fail("empty image"));
    }
    let y = image.height() / 2;
    let row: Vec<bool> = (0..image.width())
        .map(|x| image.get_pixel(x, y).0[0] < 128)
        .collect();

    // Run lengths starting at the first bar, trailing quiet zone dropped
    let first = row.iter().position(|&dark| dark).ok_or_else(|| fail("no bars"))?;
    let last = row.iter().rposition(|&dark| dark).ok_or_else(|| fail("no bars"))?;
    let mut runs: Vec<u32> = Vec::new();
    let mut current = row[first];
    let mut len = 0u32;
    for &dark in &row[first..=last] {
        if dark == current {
            len += 1;
        } else {
            runs.push(len);
            current = dark;
            len = 1;
        }
    }
    runs.push(len);

    if runs.len() < 6 + 7 {
        return Err(fail("too few bars"));
    }
    let module = runs[..6].iter().sum::<u32>() as f32 / MODULES_PER_SYMBOL as f32;

    let to_pattern = |chunk: &[u32]| -> String {
        chunk
            .iter()
            .map(|&w| {
                let modules = (w as f32 / module).round().clamp(1.0, 9.0) as u8;
                char::from(b'0' + modules)
            })
            .collect()
    };

    let mut values = Vec::new();
    let mut i = 0;
    loop {
        if i + 6 > runs.len() {
            return Err(fail("missing stop pattern"));
        }
        if runs.len() - i == 7 {
            if to_pattern(&runs[i..]) != PATTERNS[STOP as usize] {
                return Err(fail("bad stop pattern"));
            }
            break;
        }
        let pattern = to_pattern(&runs[i..i + 6]);
        let value = PATTERNS[..STOP as usize]
            .iter()
            .position(|p| *p == pattern)
            .ok_or_else(|| fail(&format!("unknown symbol pattern {}", pattern)))?;
        values.push(value as u8);
        i += 6;
    }

    if values.len() < 2 {
        return Err(fail("missing checksum"));
    }
    let (body, check) = values.split_at(values.len() - 1);
    if checksum(body) != check[0] {
        return Err(fail("checksum mismatch"));
    }

    let mut set = match body[0] {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return Err(fail("missing start code")),
    };

    let mut text = String::new();
    let mut shifted = false;
    for &value in &body[1..] {
        let active = if shifted {
            shifted = false;
            match set {
                CodeSet::A => CodeSet::B,
                _ => CodeSet::A,
            }
        } else {
            set
        };

        match (active, value) {
            (CodeSet::C, 0..=99) => text.push_str(&format!("{:02}", value)),
            (CodeSet::C, CODE_B) => set = CodeSet::B,
            (CodeSet::C, CODE_A) => set = CodeSet::A,
            (CodeSet::A, 0..=63) => text.push(char::from(value + 32)),
            (CodeSet::A, 64..=95) => text.push(char::from(value - 64)),
            (CodeSet::B, 0..=95) => text.push(char::from(value + 32)),
            (CodeSet::A | CodeSet::B, SHIFT) => shifted = true,
            (CodeSet::A | CodeSet::B, CODE_C) => set = CodeSet::C,
            (CodeSet::A, CODE_B) => set = CodeSet::B,
            (CodeSet::B, CODE_A) => set = CodeSet::A,
            _ => return Err(fail(&format!("unsupported symbol value {}", value))),
        }
    }

    Ok(text)
}
