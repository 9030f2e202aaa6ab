use std::sync::OnceLock;

use pdf_writer::{Name, Pdf, Ref};

use crate::model::{FontStyle, TextStyle};

pub(crate) const PT_PER_MM: f32 = 72.0 / 25.4;

pub(crate) struct FontEntry {
    pub(crate) pdf_name: &'static str,
    pub(crate) base_font: &'static str,
    pub(crate) widths_1000: Vec<f32>,
}

impl FontEntry {
    /// Width of a single WinAnsi byte in 1000-units.
    fn byte_width_1000(&self, byte: u8) -> f32 {
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        to_winansi_bytes(text)
            .iter()
            .map(|&b| self.byte_width_1000(b) * font_size / 1000.0)
            .sum()
    }
}

struct StandardFonts {
    regular: FontEntry,
    bold: FontEntry,
    italic: FontEntry,
}

static STANDARD_FONTS: OnceLock<StandardFonts> = OnceLock::new();

fn standard_fonts() -> &'static StandardFonts {
    STANDARD_FONTS.get_or_init(|| StandardFonts {
        regular: FontEntry {
            pdf_name: "F1",
            base_font: "Helvetica",
            widths_1000: helvetica_widths(),
        },
        bold: FontEntry {
            pdf_name: "F2",
            base_font: "Helvetica-Bold",
            widths_1000: helvetica_bold_widths(),
        },
        // Oblique shares the upright metrics.
        italic: FontEntry {
            pdf_name: "F3",
            base_font: "Helvetica-Oblique",
            widths_1000: helvetica_widths(),
        },
    })
}

pub(crate) fn font_entry(style: FontStyle) -> &'static FontEntry {
    let fonts = standard_fonts();
    match style {
        FontStyle::Regular => &fonts.regular,
        FontStyle::Bold => &fonts.bold,
        FontStyle::Italic => &fonts.italic,
    }
}

/// Rendered width of `text` in millimetres.
pub(crate) fn text_width_mm(text: &str, style: TextStyle) -> f32 {
    font_entry(style.font).text_width(text, style.size) / PT_PER_MM
}

/// Write the three standard Type1 fonts and return their resource pairs.
pub(crate) fn register_fonts(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Vec<(&'static str, Ref)> {
    [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic]
        .into_iter()
        .map(|style| {
            let entry = font_entry(style);
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(entry.base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            log::debug!("register_font: {} as {}", entry.base_font, entry.pdf_name);
            (entry.pdf_name, font_ref)
        })
        .collect()
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are dropped; see [`unencodable_chars`].
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Characters of `s` the standard fonts cannot show, in order of appearance.
pub(crate) fn unencodable_chars(s: &str) -> Vec<char> {
    s.chars().filter(|&c| char_to_winansi(c).is_none()).collect()
}

fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Helvetica widths at 1000 units/em for WinAnsi bytes 32..=255.
/// ASCII follows the Adobe AFM; the upper half uses an average glyph width.
fn helvetica_widths() -> Vec<f32> {
    const ASCII: [f32; 95] = [
        278.0, 278.0, 355.0, 556.0, 556.0, 889.0, 667.0, 191.0, // space ! " # $ % & '
        333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0, // ( ) * + , - . /
        556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, // 0-7
        556.0, 556.0, 278.0, 278.0, 584.0, 584.0, 584.0, 556.0, // 8 9 : ; < = > ?
        1015.0, 667.0, 667.0, 722.0, 722.0, 667.0, 611.0, 778.0, // @ A-G
        722.0, 278.0, 500.0, 667.0, 556.0, 833.0, 722.0, 778.0, // H-O
        667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, // P-W
        667.0, 667.0, 611.0, 278.0, 278.0, 278.0, 469.0, 556.0, // X Y Z [ \ ] ^ _
        333.0, 556.0, 556.0, 500.0, 556.0, 556.0, 278.0, 556.0, // ` a-g
        556.0, 222.0, 222.0, 500.0, 222.0, 833.0, 556.0, 556.0, // h-o
        556.0, 556.0, 333.0, 500.0, 278.0, 556.0, 500.0, 722.0, // p-w
        500.0, 500.0, 500.0, 334.0, 260.0, 334.0, 584.0, // x y z { | } ~
    ];
    with_upper_half(&ASCII)
}

fn helvetica_bold_widths() -> Vec<f32> {
    const ASCII: [f32; 95] = [
        278.0, 333.0, 474.0, 556.0, 556.0, 889.0, 722.0, 238.0, // space ! " # $ % & '
        333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0, // ( ) * + , - . /
        556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, // 0-7
        556.0, 556.0, 333.0, 333.0, 584.0, 584.0, 584.0, 611.0, // 8 9 : ; < = > ?
        975.0, 722.0, 722.0, 722.0, 722.0, 667.0, 611.0, 778.0, // @ A-G
        722.0, 278.0, 556.0, 722.0, 611.0, 833.0, 722.0, 778.0, // H-O
        667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, // P-W
        667.0, 667.0, 611.0, 333.0, 278.0, 333.0, 584.0, 556.0, // X Y Z [ \ ] ^ _
        333.0, 556.0, 611.0, 556.0, 611.0, 556.0, 333.0, 611.0, // ` a-g
        611.0, 278.0, 278.0, 556.0, 278.0, 889.0, 611.0, 611.0, // h-o
        611.0, 611.0, 389.0, 556.0, 333.0, 611.0, 556.0, 778.0, // p-w
        556.0, 556.0, 500.0, 389.0, 280.0, 389.0, 584.0, // x y z { | } ~
    ];
    with_upper_half(&ASCII)
}

fn with_upper_half(ascii: &[f32; 95]) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize],
            160 => 278.0, // nbsp
            _ => 556.0,
        })
        .collect()
}
