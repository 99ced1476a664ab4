//! PDF backend built on printpdf.
//!
//! Translates a [`LaidOutDocument`] one operation at a time. Layout
//! coordinates are measured from the top edge; PDF coordinates from the
//! bottom edge, so every `y` is flipped against the page height.

use std::cell::RefCell;
use std::io::Cursor;

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rgb,
};

use journal_core::export::layout::{Align, DrawOp, FontStyle, LaidOutDocument};
use journal_core::export::metrics::{HelveticaMetrics, TextMeasure};
use journal_core::ports::DocumentBackend;
use journal_types::{JournalError, Result};

const LAYER: &str = "Content";
const WATERMARK_LABEL_PT: f32 = 28.0;

pub struct PrintPdfBackend {
    watermark_label: String,
    /// Decoded once when set; each page gets a copy of the XObject.
    watermark_image: RefCell<Option<Image>>,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let add = |font| doc.add_builtin_font(font).map_err(export_err);
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            oblique: add(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.oblique,
        }
    }
}

fn export_err(e: impl std::fmt::Display) -> JournalError {
    JournalError::Export(e.to_string())
}

impl PrintPdfBackend {
    pub fn new(watermark_label: impl Into<String>) -> Self {
        Self {
            watermark_label: watermark_label.into(),
            watermark_image: RefCell::new(None),
        }
    }

    /// Use a PNG image as watermark instead of the text label. An image
    /// that does not decode leaves the label in place.
    pub fn set_watermark_image(&self, png: &[u8]) {
        match decode_png(png) {
            Ok(image) => *self.watermark_image.borrow_mut() = Some(image),
            Err(e) => log::warn!("Watermark image unusable, keeping label: {}", e),
        }
    }

    pub fn has_watermark_image(&self) -> bool {
        self.watermark_image.borrow().is_some()
    }

    fn draw_watermark(
        &self,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        page_height: f32,
        (x, y, width, height): (f32, f32, f32, f32),
    ) {
        let bottom = page_height - y - height;

        if let Some(image) = self.watermark_image.borrow().as_ref() {
            let (px_w, px_h) = (image.image.width.0 as f32, image.image.height.0 as f32);
            // Fit the box: pick the dpi of whichever side is tighter.
            let dpi = (px_w * 25.4 / width).max(px_h * 25.4 / height);
            let drawn_w = px_w * 25.4 / dpi;
            let drawn_h = px_h * 25.4 / dpi;
            Image::from(image.image.clone()).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(x + (width - drawn_w) / 2.0)),
                    translate_y: Some(Mm(bottom + (height - drawn_h) / 2.0)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
            return;
        }

        let label_width = HelveticaMetrics.width_mm(&self.watermark_label, FontStyle::Bold, WATERMARK_LABEL_PT);
        layer.set_fill_color(Color::Rgb(Rgb::new(0.85, 0.85, 0.85, None)));
        layer.use_text(
            self.watermark_label.clone(),
            WATERMARK_LABEL_PT,
            Mm(x + (width - label_width).max(0.0) / 2.0),
            Mm(bottom + height / 2.0),
            &fonts.bold,
        );
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }
}

fn decode_png(bytes: &[u8]) -> Result<Image> {
    let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(export_err)?;
    Image::try_from(decoder).map_err(export_err)
}

impl DocumentBackend for PrintPdfBackend {
    fn render(&self, doc: &LaidOutDocument) -> Result<Vec<u8>> {
        let (width, height) = (doc.width_mm, doc.height_mm);
        let (pdf, first_page, first_layer) = PdfDocument::new(&doc.title, Mm(width), Mm(height), LAYER);
        let fonts = Fonts::load(&pdf)?;

        for (index, page) in doc.pages.iter().enumerate() {
            let layer = if index == 0 {
                pdf.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_ref, layer_ref) = pdf.add_page(Mm(width), Mm(height), LAYER);
                pdf.get_page(page_ref).get_layer(layer_ref)
            };

            for op in &page.ops {
                match op {
                    DrawOp::Watermark { x_mm, y_mm, width_mm, height_mm } => {
                        self.draw_watermark(&layer, &fonts, height, (*x_mm, *y_mm, *width_mm, *height_mm));
                    }
                    DrawOp::Text { x_mm, y_mm, text, style, size_pt, align } => {
                        let x = match align {
                            Align::Left => *x_mm,
                            Align::Center => x_mm - HelveticaMetrics.width_mm(text, *style, *size_pt) / 2.0,
                        };
                        layer.use_text(text.clone(), *size_pt, Mm(x), Mm(height - y_mm), fonts.get(*style));
                    }
                }
            }
        }

        pdf.save_to_bytes().map_err(export_err)
    }

    fn content_type(&self) -> &str {
        "application/pdf"
    }
}
