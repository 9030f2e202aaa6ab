use crate::fonts::text_width_mm;
use crate::model::{Alignment, TextStyle};

/// Horizontal padding inside every text cell, in millimetres.
pub(super) const CELL_PADDING: f32 = 1.0;

/// Break `text` into lines no wider than `cell_width` minus padding.
/// Explicit newlines are honoured; a word wider than the line is split
/// between characters. Always returns at least one (possibly empty) line.
pub(super) fn wrap_text(text: &str, style: TextStyle, cell_width: f32) -> Vec<String> {
    let max_width = (cell_width - 2.0 * CELL_PADDING).max(0.0);
    let space_w = text_width_mm(" ", style);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.replace('\r', "").split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let word_w = text_width_mm(word, style);
            let proposed_w = if current.is_empty() {
                word_w
            } else {
                current_w + space_w + word_w
            };

            if proposed_w <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_w = proposed_w;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }

            if word_w <= max_width {
                current.push_str(word);
                current_w = word_w;
            } else {
                // Split an overlong word between characters.
                for ch in word.chars() {
                    let ch_w = text_width_mm(ch.encode_utf8(&mut [0u8; 4]), style);
                    if !current.is_empty() && current_w + ch_w > max_width {
                        lines.push(std::mem::take(&mut current));
                        current_w = 0.0;
                    }
                    current.push(ch);
                    current_w += ch_w;
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Text origin (left x, baseline y) in millimetres for a cell's text,
/// vertically centred in the cell.
pub(super) fn text_origin(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    text: &str,
    style: TextStyle,
    alignment: Alignment,
) -> (f32, f32) {
    let text_w = text_width_mm(text, style);
    let dx = match alignment {
        Alignment::Left => CELL_PADDING,
        Alignment::Center => (width - text_w) / 2.0,
        Alignment::Right => width - CELL_PADDING - text_w,
    };
    let size_mm = style.size * 25.4 / 72.0;
    (x + dx, y + 0.5 * height + 0.3 * size_mm)
}
