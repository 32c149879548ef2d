//! Label composition
//!
//! Lays the resolved shipment context and both code images onto a fixed
//! 100 x 150 mm page, top to bottom:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ [logo] Company / order / via │  header (bordered)
//! │ Ship to: name, address, phone│  address (wrapped, variable height)
//! │ Scan to track        [QR]    │  matrix code
//! │ Estimated delivery: date     │  delivery line
//! │ ||||||||||||||||||||||||||   │  barcode
//! │          tracking id         │
//! │ Terms & Conditions ...       │  terms (fills to the bottom margin)
//! └──────────────────────────────┘
//! ```
//!
//! Each band is placed with `LayoutCursor::place`, so bands never overlap.
//! The address band gets whatever height is left after reserving the fixed
//! bands and the terms caption plus one line. Address and terms text steps
//! down in size until it fits; only text that still does not fit at the
//! smallest size is cut with an ellipsis, and the region is flagged in
//! `ComposedPage::truncated`. The tracking id under the barcode is never cut.

use crate::artifact::EncodedArtifact;
use crate::context::ResolvedContext;
use crate::layout::{
    ComposedPage, Element, ImageRef, LayoutCursor, PageSize, PlacedRegion, Rect, RegionKind,
    TextRun, MM_PER_PT,
};
use crate::text::{ellipsize, text_width_mm, wrap_text, FontFace, ELLIPSIS};
use image::imageops::FilterType;
use image::{ImageError, Rgb, RgbImage};
use tracing::{debug, warn};

const MARGIN: f32 = 5.0;
const BAND_GAP: f32 = 3.0;

const HEADER_HEIGHT: f32 = 22.0;
const HEADER_PAD: f32 = 3.0;
const HEADER_BORDER_PT: f32 = 0.8;
const LOGO_SIZE: f32 = 16.0;

/// Logos are downscaled to this many pixels on the long side
const LOGO_MAX_PX: u32 = 256;

const MATRIX_SIZE: f32 = 30.0;

const BARCODE_HEIGHT: f32 = 18.0;
const BARCODE_INSET: f32 = 2.0;
const BARCODE_TEXT_GAP: f32 = 1.0;

const TITLE_PT: f32 = 12.0;
const META_PT: f32 = 8.0;
const CAPTION_PT: f32 = 9.0;
const BODY_PT: f32 = 10.0;
const TERMS_PT: f32 = 7.0;

const MIN_BODY_PT: f32 = 6.0;
const MIN_TERMS_PT: f32 = 5.0;
/// Smallest size for the printed tracking id; the longest valid id fits at it
const MIN_ID_PT: f32 = 6.0;
const FONT_STEP_PT: f32 = 0.5;

const LINE_SPACING: f32 = 1.25;

pub const SHIP_TO_CAPTION: &str = "Ship to:";
pub const SCAN_CAPTION: &str = "Scan to track";
pub const TERMS_CAPTION: &str = "Terms & Conditions";

fn line_height(size_pt: f32) -> f32 {
    size_pt * MM_PER_PT * LINE_SPACING
}

/// Baseline of a line whose box starts at `top`
fn baseline(top: f32, size_pt: f32) -> f32 {
    top + size_pt * MM_PER_PT * 0.93
}

fn text(x: f32, baseline: f32, face: FontFace, size_pt: f32, text: impl Into<String>) -> Element {
    Element::Text(TextRun {
        x,
        baseline,
        face,
        size_pt,
        text: text.into(),
    })
}

/// Result of trying to embed the company logo
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderLogo {
    Embedded(RgbImage),
    TextOnly,
}

impl HeaderLogo {
    /// Decode logo bytes, falling back to a text-only header on any failure
    ///
    /// This is the only failure the pipeline recovers from.
    pub fn from_bytes(bytes: Option<&[u8]>) -> Self {
        match bytes.map(decode_logo) {
            None => HeaderLogo::TextOnly,
            Some(Ok(image)) => HeaderLogo::Embedded(image),
            Some(Err(e)) => {
                warn!("Company logo could not be embedded, using text header: {}", e);
                HeaderLogo::TextOnly
            }
        }
    }
}

/// Decode a PNG/JPEG logo into RGB, flattening transparency onto white
pub fn decode_logo(bytes: &[u8]) -> std::result::Result<RgbImage, ImageError> {
    let mut decoded = image::load_from_memory(bytes)?;
    if decoded.width().max(decoded.height()) > LOGO_MAX_PX {
        decoded = decoded.resize(LOGO_MAX_PX, LOGO_MAX_PX, FilterType::Triangle);
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let over_white = |c: u8| -> u8 {
            let alpha = u32::from(a);
            ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        rgb.put_pixel(x, y, Rgb([over_white(r), over_white(g), over_white(b)]));
    }
    Ok(rgb)
}

/// Lays out labels on a fixed page
#[derive(Debug, Clone)]
pub struct Compositor {
    size: PageSize,
}

impl Default for Compositor {
    fn default() -> Self {
        Compositor {
            size: PageSize::LABEL_100X150,
        }
    }
}

impl Compositor {
    pub fn page_size(&self) -> PageSize {
        self.size
    }

    fn printable_width(&self) -> f32 {
        self.size.width_mm - 2.0 * MARGIN
    }

    /// Compose a label page
    ///
    /// Never fails: a logo that cannot be decoded degrades to a text header.
    pub fn compose(
        &self,
        context: &ResolvedContext,
        matrix: EncodedArtifact,
        barcode: EncodedArtifact,
        logo: Option<&[u8]>,
    ) -> ComposedPage {
        let header_logo = HeaderLogo::from_bytes(logo);
        let cursor = LayoutCursor::new(MARGIN, self.size.height_mm - MARGIN);

        let (header, cursor) = self.header_band(context, &header_logo, cursor);
        let (address, cursor) = self.address_band(context, cursor.advance(BAND_GAP));
        let (matrix_band, cursor) = self.matrix_band(cursor.advance(BAND_GAP));
        let (delivery, cursor) = self.delivery_band(context, cursor.advance(BAND_GAP));
        let (barcode_band, cursor) = self.barcode_band(context, cursor.advance(BAND_GAP));
        let (terms, cursor) = self.terms_band(context, cursor.advance(BAND_GAP));

        debug!(
            "Composed label for {}: content ends at {:.1} mm of {:.1} mm",
            context.tracking_id,
            cursor.y(),
            self.size.height_mm
        );

        ComposedPage {
            size: self.size,
            regions: vec![header, address, matrix_band, delivery, barcode_band, terms],
            logo: match header_logo {
                HeaderLogo::Embedded(image) => Some(image),
                HeaderLogo::TextOnly => None,
            },
            matrix: matrix.image,
            barcode: barcode.image,
            title: format!("Parcel Slip {}", context.tracking_id),
        }
    }

    fn header_band(
        &self,
        context: &ResolvedContext,
        logo: &HeaderLogo,
        cursor: LayoutCursor,
    ) -> (PlacedRegion, LayoutCursor) {
        let (band, next) = cursor.place(MARGIN, self.printable_width(), HEADER_HEIGHT);
        let mut elements = vec![Element::StrokeRect {
            rect: band,
            line_width_pt: HEADER_BORDER_PT,
        }];

        let mut text_x = band.x + HEADER_PAD;
        if let HeaderLogo::Embedded(image) = logo {
            elements.push(Element::Image {
                image: ImageRef::Logo,
                rect: fit_into(
                    image.width(),
                    image.height(),
                    Rect::new(text_x, band.y + HEADER_PAD, LOGO_SIZE, LOGO_SIZE),
                ),
            });
            text_x += LOGO_SIZE + HEADER_PAD;
        }

        let text_width = band.right() - HEADER_PAD - text_x;
        let lines = [
            (8.0, FontFace::Bold, TITLE_PT, context.company_name.clone()),
            (13.5, FontFace::Regular, META_PT, format!("Order #{}", context.order_id)),
            (18.5, FontFace::Regular, META_PT, format!("Courier: {}", context.courier_name)),
        ];

        let mut truncated = false;
        for (offset, face, size, line) in lines {
            let printed = ellipsize(&line, face, size, text_width);
            truncated |= printed != line;
            elements.push(text(text_x, band.y + offset, face, size, printed));
        }
        if truncated {
            warn!("Header for {} is too wide; truncating", context.tracking_id);
        }

        (
            PlacedRegion {
                kind: RegionKind::Header,
                rect: band,
                elements,
                truncated,
            },
            next,
        )
    }

    /// Height of everything below the address band, gaps included
    fn reserved_below_address(&self) -> f32 {
        BAND_GAP
            + MATRIX_SIZE
            + BAND_GAP
            + line_height(BODY_PT)
            + BAND_GAP
            + barcode_band_height()
            + BAND_GAP
            + line_height(TERMS_PT)
            + line_height(MIN_TERMS_PT)
    }

    fn address_band(
        &self,
        context: &ResolvedContext,
        cursor: LayoutCursor,
    ) -> (PlacedRegion, LayoutCursor) {
        let width = self.printable_width();
        let caption_h = line_height(CAPTION_PT);

        let phone = context.client_phone.as_ref().map(|p| format!("Phone: {}", p));
        let mut paragraphs = vec![context.client_name.as_str(), context.client_address.as_str()];
        paragraphs.extend(phone.as_deref());

        let budget = cursor.remaining() - self.reserved_below_address() - caption_h;
        let fitted = fit_text(&paragraphs, BODY_PT, MIN_BODY_PT, width, budget, 1);
        if fitted.truncated {
            warn!(
                "Address for {} does not fit at {} pt; truncating to {} lines",
                context.tracking_id,
                fitted.size_pt,
                fitted.lines.len()
            );
        } else if fitted.size_pt < BODY_PT {
            debug!(
                "Address for {} set at {} pt to fit",
                context.tracking_id, fitted.size_pt
            );
        }

        let body_h = line_height(fitted.size_pt);
        let height = caption_h + fitted.lines.len() as f32 * body_h;
        let (band, next) = cursor.place(MARGIN, width, height);

        let mut elements = vec![text(
            band.x,
            baseline(band.y, CAPTION_PT),
            FontFace::Bold,
            CAPTION_PT,
            SHIP_TO_CAPTION,
        )];
        // One line per cursor step; the line count comes from the wrap, not a constant
        let mut line_cursor = LayoutCursor::new(band.y + caption_h, band.bottom());
        for line in fitted.lines {
            let (slot, after) = line_cursor.place(band.x, width, body_h);
            elements.push(text(
                slot.x,
                baseline(slot.y, fitted.size_pt),
                FontFace::Regular,
                fitted.size_pt,
                line,
            ));
            line_cursor = after;
        }

        (
            PlacedRegion {
                kind: RegionKind::Address,
                rect: band,
                elements,
                truncated: fitted.truncated,
            },
            next,
        )
    }

    fn matrix_band(&self, cursor: LayoutCursor) -> (PlacedRegion, LayoutCursor) {
        let (band, next) = cursor.place(MARGIN, self.printable_width(), MATRIX_SIZE);
        let image_rect = Rect::new(band.right() - MATRIX_SIZE, band.y, MATRIX_SIZE, MATRIX_SIZE);

        let elements = vec![
            text(
                band.x,
                band.y + MATRIX_SIZE / 2.0,
                FontFace::Regular,
                CAPTION_PT,
                SCAN_CAPTION,
            ),
            Element::Image {
                image: ImageRef::Matrix,
                rect: image_rect,
            },
        ];

        (
            PlacedRegion {
                kind: RegionKind::MatrixCode,
                rect: band,
                elements,
                truncated: false,
            },
            next,
        )
    }

    fn delivery_band(
        &self,
        context: &ResolvedContext,
        cursor: LayoutCursor,
    ) -> (PlacedRegion, LayoutCursor) {
        let (band, next) = cursor.place(MARGIN, self.printable_width(), line_height(BODY_PT));
        let line = format!("Estimated delivery: {}", context.estimated_delivery);

        (
            PlacedRegion {
                kind: RegionKind::Delivery,
                rect: band,
                elements: vec![text(
                    band.x,
                    baseline(band.y, BODY_PT),
                    FontFace::Bold,
                    BODY_PT,
                    line,
                )],
                truncated: false,
            },
            next,
        )
    }

    fn barcode_band(
        &self,
        context: &ResolvedContext,
        cursor: LayoutCursor,
    ) -> (PlacedRegion, LayoutCursor) {
        let width = self.printable_width();
        let (band, next) = cursor.place(MARGIN, width, barcode_band_height());
        let image_rect = Rect::new(
            band.x + BARCODE_INSET,
            band.y,
            width - 2.0 * BARCODE_INSET,
            BARCODE_HEIGHT,
        );

        // The id is only ever shrunk; TrackingId::MAX_LENGTH keeps it inside at MIN_ID_PT
        let id = context.tracking_id.as_str();
        let mut size = BODY_PT;
        while size > MIN_ID_PT && text_width_mm(id, FontFace::Regular, size) > width {
            size -= FONT_STEP_PT;
        }
        let printed_width = text_width_mm(id, FontFace::Regular, size);

        let elements = vec![
            Element::Image {
                image: ImageRef::Barcode,
                rect: image_rect,
            },
            text(
                band.x + (width - printed_width) / 2.0,
                baseline(band.y + BARCODE_HEIGHT + BARCODE_TEXT_GAP, size),
                FontFace::Regular,
                size,
                id,
            ),
        ];

        (
            PlacedRegion {
                kind: RegionKind::Barcode,
                rect: band,
                elements,
                truncated: false,
            },
            next,
        )
    }

    fn terms_band(
        &self,
        context: &ResolvedContext,
        cursor: LayoutCursor,
    ) -> (PlacedRegion, LayoutCursor) {
        let width = self.printable_width();
        let caption_h = line_height(TERMS_PT);

        let fitted = fit_text(
            &[context.terms.as_str()],
            TERMS_PT,
            MIN_TERMS_PT,
            width,
            cursor.remaining() - caption_h,
            1,
        );
        if fitted.truncated {
            warn!(
                "Terms do not fit above the bottom margin at {} pt; truncating to {} lines",
                fitted.size_pt,
                fitted.lines.len()
            );
        }

        let line_h = line_height(fitted.size_pt);
        let (band, next) = cursor.place(
            MARGIN,
            width,
            caption_h + fitted.lines.len() as f32 * line_h,
        );

        let mut elements = vec![text(
            band.x,
            baseline(band.y, TERMS_PT),
            FontFace::Bold,
            TERMS_PT,
            TERMS_CAPTION,
        )];
        let mut line_cursor = LayoutCursor::new(band.y + caption_h, band.bottom());
        for line in fitted.lines {
            let (slot, after) = line_cursor.place(band.x, width, line_h);
            elements.push(text(
                slot.x,
                baseline(slot.y, fitted.size_pt),
                FontFace::Regular,
                fitted.size_pt,
                line,
            ));
            line_cursor = after;
        }

        (
            PlacedRegion {
                kind: RegionKind::Terms,
                rect: band,
                elements,
                truncated: fitted.truncated,
            },
            next,
        )
    }
}

fn barcode_band_height() -> f32 {
    BARCODE_HEIGHT + BARCODE_TEXT_GAP + line_height(BODY_PT)
}

/// Wrapped text and the size it was set at
#[derive(Debug)]
struct FittedText {
    size_pt: f32,
    lines: Vec<String>,
    truncated: bool,
}

/// Wrap `paragraphs` at the largest size between `max_pt` and `min_pt` whose
/// lines fit in `height`
///
/// At `min_pt` any overflow is cut with an ellipsis. At least `min_lines`
/// lines are kept whatever the height.
fn fit_text(
    paragraphs: &[&str],
    max_pt: f32,
    min_pt: f32,
    width: f32,
    height: f32,
    min_lines: usize,
) -> FittedText {
    let mut size_pt = max_pt;
    loop {
        let mut lines: Vec<String> = paragraphs
            .iter()
            .flat_map(|p| wrap_text(p, FontFace::Regular, size_pt, width))
            .collect();
        let capacity = ((height / line_height(size_pt)).floor().max(0.0) as usize).max(min_lines);

        if lines.len() <= capacity {
            return FittedText {
                size_pt,
                lines,
                truncated: false,
            };
        }
        if size_pt - FONT_STEP_PT < min_pt {
            truncate_with_ellipsis(&mut lines, capacity, FontFace::Regular, size_pt, width);
            return FittedText {
                size_pt,
                lines,
                truncated: true,
            };
        }
        size_pt -= FONT_STEP_PT;
    }
}

/// Keep the first `keep` lines, marking the cut on the last one kept
fn truncate_with_ellipsis(
    lines: &mut Vec<String>,
    keep: usize,
    face: FontFace,
    size_pt: f32,
    width: f32,
) {
    lines.truncate(keep);
    if let Some(last) = lines.last_mut() {
        *last = ellipsize(&format!("{}{}", last, ELLIPSIS), face, size_pt, width);
    }
}

/// Largest rect with the image's aspect ratio inside `bounds`, centred
fn fit_into(width_px: u32, height_px: u32, bounds: Rect) -> Rect {
    let aspect = width_px as f32 / height_px.max(1) as f32;
    let (w, h) = if aspect >= bounds.width / bounds.height {
        (bounds.width, bounds.width / aspect)
    } else {
        (bounds.height * aspect, bounds.height)
    };
    Rect::new(
        bounds.x + (bounds.width - w) / 2.0,
        bounds.y + (bounds.height - h) / 2.0,
        w,
        h,
    )
}
