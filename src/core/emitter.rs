//! PDF emission
//!
//! Serializes a `ComposedPage` into a single-page PDF with lopdf. Text uses
//! the standard Helvetica faces, so no fonts are embedded. The three
//! rasters become image XObjects. The document carries no creation date
//! or random identifier, so equal pages give equal bytes.

use crate::error::{LabelError, Result};
use crate::layout::{ComposedPage, Element, ImageRef, Rect, TextRun, PT_PER_MM};
use crate::text::{encode_win_ansi, FontFace};
use crate::validation::{sanitize_file_component, TrackingId};
use chrono::NaiveDate;
use image::{GrayImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

pub const PDF_VERSION: &str = "1.5";
pub const PRODUCER: &str = concat!("parcel-slip ", env!("CARGO_PKG_VERSION"));
const PDF_HEADER: &[u8] = b"%PDF-";

/// File name for a label: `Parcel_Slip_<id>_<YYYY-MM-DD>.pdf`
///
/// Characters outside `[A-Za-z0-9._-]` in the id become `_`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use parcel_slip::core::emitter::slip_file_name;
/// use parcel_slip::core::validation::TrackingId;
///
/// let id = TrackingId::new("SC-42").unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
/// assert_eq!(slip_file_name(&id, date), "Parcel_Slip_SC-42_2024-01-30.pdf");
/// ```
pub fn slip_file_name(tracking_id: &TrackingId, date: NaiveDate) -> String {
    format!(
        "Parcel_Slip_{}_{}.pdf",
        sanitize_file_component(tracking_id.as_str()),
        date.format("%Y-%m-%d")
    )
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn literal(text: &str) -> Object {
    Object::String(encode_win_ansi(text), StringFormat::Literal)
}

/// Writes composed pages as PDF documents
#[derive(Debug, Clone, Default)]
pub struct PdfEmitter;

impl PdfEmitter {
    pub fn new() -> Self {
        PdfEmitter
    }

    /// Serialize `page` into PDF bytes
    ///
    /// # Errors
    ///
    /// Returns `Generation` if lopdf fails to serialize, if an element refers
    /// to an image the page does not carry, or if the output is not a PDF.
    pub fn emit(&self, page: &ComposedPage) -> Result<Vec<u8>> {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for face in [FontFace::Regular, FontFace::Bold] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(face.resource_name(), font_id);
        }

        let mut images = Dictionary::new();
        if let Some(logo) = &page.logo {
            let id = doc.add_object(rgb_xobject(logo));
            images.set(ImageRef::Logo.resource_name(), id);
        }
        let id = doc.add_object(gray_xobject(&page.matrix));
        images.set(ImageRef::Matrix.resource_name(), id);
        let id = doc.add_object(gray_xobject(&page.barcode));
        images.set(ImageRef::Barcode.resource_name(), id);

        let operations = self.operations(page)?;
        let content = Content { operations }
            .encode()
            .map_err(|e| LabelError::Generation(format!("content stream: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(page.size.width_pt()),
                real(page.size.height_pt()),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => fonts,
                "XObject" => images,
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = self.info(&mut doc, page);
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| LabelError::Generation(format!("PDF serialization failed: {}", e)))?;

        if bytes.len() <= PDF_HEADER.len() || !bytes.starts_with(PDF_HEADER) {
            return Err(LabelError::Generation(format!(
                "serializer produced {} bytes without a PDF header",
                bytes.len()
            )));
        }

        debug!("Emitted '{}': {} bytes", page.title, bytes.len());
        Ok(bytes)
    }

    fn info(&self, doc: &mut Document, page: &ComposedPage) -> ObjectId {
        doc.add_object(dictionary! {
            "Title" => literal(&page.title),
            "Producer" => literal(PRODUCER),
        })
    }

    fn operations(&self, page: &ComposedPage) -> Result<Vec<Operation>> {
        let page_height = page.size.height_mm;
        let mut ops = Vec::new();

        for region in &page.regions {
            for element in &region.elements {
                match element {
                    Element::Text(run) => text_ops(&mut ops, run, page_height),
                    Element::Image { image, rect } => {
                        if *image == ImageRef::Logo && page.logo.is_none() {
                            return Err(LabelError::Generation(
                                "layout draws a logo the page does not carry".to_string(),
                            ));
                        }
                        image_ops(&mut ops, *image, rect, page_height);
                    }
                    Element::StrokeRect {
                        rect,
                        line_width_pt,
                    } => {
                        let (x, y, w, h) = to_user_space(rect, page_height);
                        ops.push(Operation::new("q", vec![]));
                        ops.push(Operation::new("w", vec![real(*line_width_pt)]));
                        ops.push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
                        ops.push(Operation::new("S", vec![]));
                        ops.push(Operation::new("Q", vec![]));
                    }
                }
            }
        }

        Ok(ops)
    }
}

/// Top-left millimetre rect to bottom-left point rect `(x, y, w, h)`
fn to_user_space(rect: &Rect, page_height_mm: f32) -> (f32, f32, f32, f32) {
    (
        rect.x * PT_PER_MM,
        (page_height_mm - rect.bottom()) * PT_PER_MM,
        rect.width * PT_PER_MM,
        rect.height * PT_PER_MM,
    )
}

fn text_ops(ops: &mut Vec<Operation>, run: &TextRun, page_height_mm: f32) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![name(run.face.resource_name()), real(run.size_pt)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![
            real(run.x * PT_PER_MM),
            real((page_height_mm - run.baseline) * PT_PER_MM),
        ],
    ));
    ops.push(Operation::new("Tj", vec![literal(&run.text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn image_ops(ops: &mut Vec<Operation>, image: ImageRef, rect: &Rect, page_height_mm: f32) {
    let (x, y, w, h) = to_user_space(rect, page_height_mm);
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![real(w), real(0.0), real(0.0), real(h), real(x), real(y)],
    ));
    ops.push(Operation::new("Do", vec![name(image.resource_name())]));
    ops.push(Operation::new("Q", vec![]));
}

fn gray_xobject(image: &GrayImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(image.width())),
            "Height" => Object::Integer(i64::from(image.height())),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
            "Interpolate" => Object::Boolean(false),
        },
        image.as_raw().clone(),
    )
}

fn rgb_xobject(image: &RgbImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(image.width())),
            "Height" => Object::Integer(i64::from(image.height())),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
        },
        image.as_raw().clone(),
    )
}
