//! Text measurement for line wrapping.
//!
//! The exporter wraps text itself, so it needs glyph advances. The built-in
//! table covers the standard Helvetica faces every PDF viewer ships with.

use super::layout::FontStyle;

/// Millimetres per typographic point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

pub trait TextMeasure {
    /// Width of `text` in millimetres when set in `style` at `size_pt`.
    fn width_mm(&self, text: &str, style: FontStyle, size_pt: f32) -> f32;
}

/// Advance widths of the standard Helvetica faces (1/1000 em).
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

// ASCII 32..=126
const REGULAR: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK: u16 = 556;
const BULLET: u16 = 350;

impl HelveticaMetrics {
    fn advance(ch: char, style: FontStyle) -> u16 {
        let table = match style {
            FontStyle::Bold => &BOLD,
            // Oblique shares the regular advances.
            FontStyle::Normal | FontStyle::Italic => &REGULAR,
        };
        let base = match ch {
            'å' | 'ä' | 'á' | 'à' | 'â' => 'a',
            'Å' | 'Ä' | 'Á' | 'À' => 'A',
            'ö' | 'ó' | 'ò' | 'ô' | 'ø' => 'o',
            'Ö' | 'Ó' | 'Ø' => 'O',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' => 'E',
            'ü' | 'ú' => 'u',
            'Ü' => 'U',
            'µ' => 'u',
            '\u{00a0}' => ' ',
            '•' => return BULLET,
            other => other,
        };
        match base as u32 {
            32..=126 => table[(base as u32 - 32) as usize],
            _ => FALLBACK,
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn width_mm(&self, text: &str, style: FontStyle, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| Self::advance(c, style) as u32).sum();
        units as f32 / 1000.0 * size_pt * PT_TO_MM
    }
}
