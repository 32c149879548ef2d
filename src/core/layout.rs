//! Page geometry and the composed page model
//!
//! All coordinates are millimetres with the origin at the top-left corner of
//! the page and y growing downward. The emitter flips to PDF user space.
//!
//! Layout advances a single `LayoutCursor` value. `place` hands back the
//! placed rectangle together with the next cursor, and the next cursor is
//! never above the previous one, so regions placed in sequence cannot overlap.

use crate::text::FontFace;
use image::{GrayImage, RgbImage};

/// Millimetres per PostScript point
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// PostScript points per millimetre
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Physical page size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    /// 100 x 150 mm (4 x 6 in) portrait thermal label
    pub const LABEL_100X150: PageSize = PageSize {
        width_mm: 100.0,
        height_mm: 150.0,
    };

    pub fn width_pt(&self) -> f32 {
        self.width_mm * PT_PER_MM
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * PT_PER_MM
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the interiors overlap; shared edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right() + f32::EPSILON
            && other.bottom() <= self.bottom() + f32::EPSILON
    }
}

/// Vertical layout position
///
/// Copyable and immutable; every operation returns a new cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    y: f32,
    limit: f32,
}

impl LayoutCursor {
    /// Start at `top`; `limit` is the lowest usable y coordinate
    pub fn new(top: f32, limit: f32) -> Self {
        LayoutCursor { y: top, limit }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Space left between the cursor and the limit
    pub fn remaining(&self) -> f32 {
        (self.limit - self.y).max(0.0)
    }

    /// Place a band of `height` at the cursor, returning it and the next cursor
    ///
    /// Negative heights are treated as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_slip::core::layout::LayoutCursor;
    ///
    /// let cursor = LayoutCursor::new(5.0, 145.0);
    /// let (band, next) = cursor.place(5.0, 90.0, 22.0);
    /// assert_eq!(band.y, 5.0);
    /// assert_eq!(next.y(), 27.0);
    /// ```
    pub fn place(self, x: f32, width: f32, height: f32) -> (Rect, LayoutCursor) {
        let height = height.max(0.0);
        let rect = Rect::new(x, self.y, width, height);
        (
            rect,
            LayoutCursor {
                y: self.y + height,
                limit: self.limit,
            },
        )
    }

    /// Skip a vertical gap
    pub fn advance(self, gap: f32) -> LayoutCursor {
        LayoutCursor {
            y: self.y + gap.max(0.0),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Header,
    Address,
    MatrixCode,
    Delivery,
    Barcode,
    Terms,
}

/// Which page-owned image an element draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRef {
    Logo,
    Matrix,
    Barcode,
}

impl ImageRef {
    pub fn resource_name(self) -> &'static str {
        match self {
            ImageRef::Logo => "Im1",
            ImageRef::Matrix => "Im2",
            ImageRef::Barcode => "Im3",
        }
    }
}

/// One line of text, positioned by its baseline
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub face: FontFace,
    pub size_pt: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextRun),
    Image { image: ImageRef, rect: Rect },
    StrokeRect { rect: Rect, line_width_pt: f32 },
}

/// A placed band and what is drawn inside it
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRegion {
    pub kind: RegionKind,
    pub rect: Rect,
    pub elements: Vec<Element>,
    /// Set when text in this region was cut to stay on the page
    pub truncated: bool,
}

impl PlacedRegion {
    /// Text of every run in this region, in drawing order
    pub fn lines(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<ImageRef> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Image { image, .. } => Some(*image),
                _ => None,
            })
            .collect()
    }
}

/// A fully laid out label page, ready for emission
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub size: PageSize,
    /// Header, Address, MatrixCode, Delivery, Barcode, Terms, top to bottom
    pub regions: Vec<PlacedRegion>,
    /// Decoded logo, present only when it embedded successfully
    pub logo: Option<RgbImage>,
    pub matrix: GrayImage,
    pub barcode: GrayImage,
    /// Document title
    pub title: String,
}

impl ComposedPage {
    pub fn region(&self, kind: RegionKind) -> Option<&PlacedRegion> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// Text lines of a region, empty when the region is absent
    pub fn lines(&self, kind: RegionKind) -> Vec<&str> {
        self.region(kind).map(|r| r.lines()).unwrap_or_default()
    }

    /// Regions whose text was cut to stay on the page, top to bottom
    pub fn truncated(&self) -> Vec<RegionKind> {
        self.regions
            .iter()
            .filter(|r| r.truncated)
            .map(|r| r.kind)
            .collect()
    }

    /// True when every piece of text made it onto the page in full
    pub fn is_complete(&self) -> bool {
        self.regions.iter().all(|r| !r.truncated)
    }

    /// True when no two regions overlap and all lie on the page
    pub fn is_non_overlapping(&self) -> bool {
        let page = Rect::new(0.0, 0.0, self.size.width_mm, self.size.height_mm);
        self.regions.iter().all(|r| page.contains(&r.rect))
            && self.regions.iter().enumerate().all(|(i, a)| {
                self.regions[i + 1..]
                    .iter()
                    .all(|b| !a.rect.intersects(&b.rect))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_monotonic() {
        let cursor = LayoutCursor::new(5.0, 145.0);
        let (a, cursor) = cursor.place(5.0, 90.0, 10.0);
        let cursor = cursor.advance(3.0);
        let (b, cursor) = cursor.place(5.0, 90.0, -4.0);
        let cursor = cursor.advance(-2.0);
        let (c, cursor) = cursor.place(5.0, 90.0, 7.5);

        assert_eq!(a.y, 5.0);
        assert_eq!(b.y, 18.0);
        assert_eq!(b.height, 0.0);
        assert_eq!(c.y, 18.0);
        assert_eq!(cursor.y(), 25.5);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_remaining() {
        let cursor = LayoutCursor::new(140.0, 145.0);
        assert_eq!(cursor.remaining(), 5.0);
        assert_eq!(cursor.advance(10.0).remaining(), 0.0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(0.0, 10.0, 10.0, 5.0);
        let overlapping = Rect::new(5.0, 5.0, 10.0, 10.0);

        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
        assert!(a.contains(&Rect::new(1.0, 1.0, 9.0, 9.0)));
        assert!(!a.contains(&overlapping));
    }

    #[test]
    fn test_page_size_points() {
        let size = PageSize::LABEL_100X150;
        assert!((size.width_pt() - 283.46).abs() < 0.01);
        assert!((size.height_pt() - 425.20).abs() < 0.01);
    }
}
