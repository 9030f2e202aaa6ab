mod assemble;
mod layout;
mod logo;

use crate::config::Letterhead;
use crate::error::Error;
use crate::fonts::unencodable_chars;
use crate::model::{
    AgreementDocument, Alignment, FontStyle, LayoutOverflow, PageLayout, Placed, SectionBlock,
    TextStyle, UnencodableText,
};

use layout::wrap_text;
use logo::Logo;

/// Operational reserve at the bottom of the page: section titles and bordered
/// sections that would start below `page_height - SAFETY_RESERVE` go to the
/// next page. Layered on top of the base auto page-break margin.
pub const SAFETY_RESERVE: f32 = 40.0;
pub const ROW_HEIGHT: f32 = 7.0;
pub const SECTION_OVERHEAD: f32 = 15.0;
pub const SECTION_WIDTH: f32 = 160.0;
pub const LABEL_WIDTH: f32 = 60.0;
const SECTION_INDENT: f32 = 5.0;
const DIVIDER_GAP: f32 = 3.0;
const VALUE_LINE_HEIGHT: f32 = 6.0;
const SECTION_TRAILING_GAP: f32 = 4.0;
const SIGNATURE_CELL_WIDTH: f32 = 90.0;
const SIGNATURE_CELL_HEIGHT: f32 = 20.0;

const LOGO_Y: f32 = 10.0;
const LOGO_WIDTH: f32 = 25.0;
const HEADER_TITLE_HEIGHT: f32 = 8.0;
const HEADER_SUBTITLE_HEIGHT: f32 = 5.0;
const HEADER_GAP: f32 = 8.0;
const FOOTER_OFFSET: f32 = 15.0;
const FOOTER_LINE_HEIGHT: f32 = 4.0;

pub const HEADER_TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 14.0);
pub const HEADER_SUBTITLE: TextStyle = TextStyle::new(FontStyle::Regular, 9.0);
pub const FOOTER_TEXT: TextStyle = TextStyle::new(FontStyle::Italic, 7.0);
pub const SECTION_TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 11.0);
pub const BLOCK_TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 10.0);
pub const LABEL_TEXT: TextStyle = TextStyle::new(FontStyle::Bold, 9.0);
pub const VALUE_TEXT: TextStyle = TextStyle::new(FontStyle::Regular, 9.0);
pub const BODY_TEXT: TextStyle = TextStyle::new(FontStyle::Regular, 9.0);
pub const SIGNATURE_TEXT: TextStyle = TextStyle::new(FontStyle::Regular, 10.0);

/// Height reserved for a bordered section of `field_count` rows. Deliberately
/// coarse: wrapped values are not accounted for.
pub fn estimated_height(field_count: usize) -> f32 {
    field_count as f32 * ROW_HEIGHT + SECTION_OVERHEAD
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Page size and margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl PageGeometry {
    /// A4 portrait, margins 25/15/25 and a 30mm auto page-break margin.
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margins: Margins {
                left: 25.0,
                top: 15.0,
                right: 25.0,
                bottom: 30.0,
            },
        }
    }

    /// y beyond which text cells continue on a new page.
    pub fn page_break_threshold(&self) -> f32 {
        self.height - self.margins.bottom
    }

    /// y beyond which titles and bordered sections start on a new page.
    pub fn reserved_threshold(&self) -> f32 {
        self.height - SAFETY_RESERVE
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CanvasOptions {
    pub geometry: PageGeometry,
    /// Header, footer and logo drawn on every page; `None` draws a bare page.
    pub letterhead: Option<Letterhead>,
}

/// Cursor position in millimetres from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug)]
pub struct PageState {
    pub cursor: Cursor,
    pub geometry: PageGeometry,
    pub page_count: usize,
}

/// Where a cell leaves the cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// To the right edge of the cell, same row.
    Right,
    /// To the left margin, below the cell.
    NextLine,
}

/// Single-owner page surface. One instance per render; dropped or consumed
/// by [`Canvas::finish`] when done.
pub struct Canvas {
    state: PageState,
    letterhead: Option<Letterhead>,
    logo: Option<Logo>,
    pages: Vec<PageLayout>,
    current: Vec<Placed>,
    overflows: Vec<LayoutOverflow>,
    unencodable: Vec<UnencodableText>,
    // Header/footer drawing never triggers an automatic page break.
    in_page_furniture: bool,
}

impl Canvas {
    /// Fails fast when the letterhead logo cannot be read or decoded.
    pub fn new(options: CanvasOptions) -> Result<Self, Error> {
        let logo = match &options.letterhead {
            Some(lh) => Some(logo::load_logo(&lh.logo)?),
            None => None,
        };
        let margins = options.geometry.margins;
        Ok(Self {
            state: PageState {
                cursor: Cursor {
                    x: margins.left,
                    y: margins.top,
                },
                geometry: options.geometry,
                page_count: 0,
            },
            letterhead: options.letterhead,
            logo,
            pages: Vec::new(),
            current: Vec::new(),
            overflows: Vec::new(),
            unencodable: Vec::new(),
            in_page_furniture: false,
        })
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.state.cursor
    }

    pub fn page_count(&self) -> usize {
        self.state.page_count
    }

    /// y at which body content begins on every page, below the header.
    pub fn body_top(&self) -> f32 {
        let top = self.state.geometry.margins.top;
        if self.letterhead.is_some() {
            top + HEADER_TITLE_HEIGHT + HEADER_SUBTITLE_HEIGHT + HEADER_GAP
        } else {
            top
        }
    }

    /// Items placed so far on the page being drawn.
    pub fn current_items(&self) -> &[Placed] {
        &self.current
    }

    pub fn begin_document(&mut self) {
        if self.state.page_count == 0 {
            self.new_page();
        }
    }

    pub fn new_page(&mut self) {
        if self.state.page_count > 0 {
            self.footer();
            self.flush_page();
        }
        self.state.page_count += 1;
        let margins = self.state.geometry.margins;
        self.state.cursor = Cursor {
            x: margins.left,
            y: margins.top,
        };
        log::debug!("new_page: page {}", self.state.page_count);
        self.header();
    }

    fn flush_page(&mut self) {
        self.pages.push(PageLayout {
            number: self.state.page_count,
            items: std::mem::take(&mut self.current),
        });
    }

    fn header(&mut self) {
        let Some(lh) = self.letterhead.clone() else {
            return;
        };
        self.in_page_furniture = true;
        if let Some(logo) = &self.logo {
            let height = logo.height_for_width(LOGO_WIDTH);
            self.current.push(Placed::Logo {
                x: self.state.geometry.margins.left,
                y: LOGO_Y,
                width: LOGO_WIDTH,
                height,
            });
        }
        self.cell(0.0, HEADER_TITLE_HEIGHT, &lh.title, HEADER_TITLE, Alignment::Center, Advance::NextLine);
        self.cell(
            0.0,
            HEADER_SUBTITLE_HEIGHT,
            &lh.subtitle,
            HEADER_SUBTITLE,
            Alignment::Center,
            Advance::NextLine,
        );
        self.gap(HEADER_GAP);
        self.in_page_furniture = false;
    }

    fn footer(&mut self) {
        let Some(lh) = self.letterhead.clone() else {
            return;
        };
        self.in_page_furniture = true;
        self.state.cursor = Cursor {
            x: self.state.geometry.margins.left,
            y: self.state.geometry.height - FOOTER_OFFSET,
        };
        for line in &lh.footer_lines {
            self.cell(0.0, FOOTER_LINE_HEIGHT, line, FOOTER_TEXT, Alignment::Center, Advance::NextLine);
        }
        self.in_page_furniture = false;
    }

    fn place(&mut self, item: Placed) {
        if self.state.page_count == 0 {
            self.new_page();
        }
        self.current.push(item);
    }

    /// Start a new page when a `height`-tall cell at the cursor would cross
    /// the auto page-break threshold. The cursor keeps its x.
    fn break_if_needed(&mut self, height: f32) {
        if self.in_page_furniture || self.state.page_count == 0 {
            return;
        }
        if self.state.cursor.y + height > self.state.geometry.page_break_threshold() {
            let x = self.state.cursor.x;
            self.new_page();
            self.state.cursor.x = x;
        }
    }

    /// A single-line text cell at the cursor. `width == 0` extends to the
    /// right margin. Empty text places nothing but still advances.
    pub fn cell(
        &mut self,
        width: f32,
        height: f32,
        text: &str,
        style: TextStyle,
        alignment: Alignment,
        advance: Advance,
    ) {
        if self.state.page_count == 0 {
            self.new_page();
        }
        self.break_if_needed(height);
        let Cursor { x, y } = self.state.cursor;
        let width = if width <= 0.0 {
            self.state.geometry.width - self.state.geometry.margins.right - x
        } else {
            width
        };
        if !text.is_empty() {
            self.check_encodable(text);
            self.place(Placed::Text {
                x,
                y,
                width,
                height,
                text: text.to_string(),
                style,
                alignment,
            });
        }
        self.state.cursor = match advance {
            Advance::Right => Cursor { x: x + width, y },
            Advance::NextLine => Cursor {
                x: self.state.geometry.margins.left,
                y: y + height,
            },
        };
    }

    fn check_encodable(&mut self, text: &str) {
        let dropped = unencodable_chars(text);
        if dropped.is_empty() {
            return;
        }
        log::warn!(
            "page {}: {} character(s) of {text:?} cannot be shown in the standard fonts and are left out",
            self.state.page_count,
            dropped.len()
        );
        self.unencodable.push(UnencodableText {
            page: self.state.page_count,
            text: text.to_string(),
            dropped,
        });
    }

    /// Wrapped left-aligned text in a `width`-wide column starting at the
    /// cursor x. Each line may break onto a new page. Leaves the cursor at
    /// the left margin below the last line; returns the number of lines.
    pub fn multi_cell(&mut self, width: f32, line_height: f32, text: &str, style: TextStyle) -> usize {
        let x = self.state.cursor.x;
        let lines = wrap_text(text, style, width);
        for line in &lines {
            self.state.cursor.x = x;
            self.cell(width, line_height, line, style, Alignment::Left, Advance::NextLine);
        }
        self.state.cursor.x = self.state.geometry.margins.left;
        lines.len()
    }

    /// Full-width text line; the cursor moves to the next line.
    pub fn text_line(&mut self, text: &str, style: TextStyle, height: f32, alignment: Alignment) {
        self.cell(0.0, height, text, style, alignment, Advance::NextLine);
    }

    /// Vertical advance; the cursor returns to the left margin.
    pub fn gap(&mut self, height: f32) {
        self.state.cursor = Cursor {
            x: self.state.geometry.margins.left,
            y: self.state.cursor.y + height,
        };
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.state.cursor = Cursor { x, y };
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.place(Placed::Line { x1, y1, x2, y2 });
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.place(Placed::Rect { x, y, width, height });
    }

    pub fn section_title(&mut self, text: &str) {
        if self.state.page_count == 0 {
            self.new_page();
        }
        if self.state.cursor.y > self.state.geometry.reserved_threshold() {
            log::debug!(
                "section_title {text:?}: y={:.1} past reserve, new page",
                self.state.cursor.y
            );
            self.new_page();
        }
        self.cell(0.0, 6.0, text, SECTION_TITLE, Alignment::Left, Advance::NextLine);
        self.gap(3.0);
    }

    pub fn bordered_section(&mut self, block: &SectionBlock) {
        if self.state.page_count == 0 {
            self.new_page();
        }
        let estimated = estimated_height(block.rows.len());
        if self.state.cursor.y + estimated > self.state.geometry.reserved_threshold() {
            log::debug!(
                "bordered_section {:?}: y={:.1} + {estimated:.1} past reserve, new page",
                block.title,
                self.state.cursor.y
            );
            self.new_page();
        }

        let Cursor { x: x_start, y: y_start } = self.state.cursor;
        let start_page = self.state.page_count;
        let estimated_bottom = y_start + estimated;

        self.rect(x_start, y_start, SECTION_WIDTH, estimated);
        self.cell(0.0, 6.0, &block.title, BLOCK_TITLE, Alignment::Left, Advance::NextLine);
        self.gap(2.0);
        self.set_xy(x_start + SECTION_INDENT, self.state.cursor.y);

        let value_width = SECTION_WIDTH - LABEL_WIDTH - DIVIDER_GAP - 2.0 * SECTION_INDENT;
        let mut overflowed = false;
        for (label, value) in &block.rows {
            self.cell(
                LABEL_WIDTH,
                VALUE_LINE_HEIGHT,
                &format!("{label}:"),
                LABEL_TEXT,
                Alignment::Left,
                Advance::Right,
            );
            let Cursor { x: line_x, y: line_y } = self.state.cursor;
            self.line(line_x, line_y, line_x, line_y + VALUE_LINE_HEIGHT);

            self.set_xy(line_x + DIVIDER_GAP, line_y);
            self.multi_cell(
                value_width,
                VALUE_LINE_HEIGHT,
                value.as_deref().unwrap_or(""),
                VALUE_TEXT,
            );

            let row_bottom = self.state.cursor.y;
            self.set_xy(x_start + SECTION_INDENT, row_bottom);
            self.line(x_start, row_bottom, x_start + SECTION_WIDTH, row_bottom);

            let past_border = self.state.page_count != start_page || row_bottom > estimated_bottom;
            if past_border && !overflowed {
                overflowed = true;
                log::warn!(
                    "layout overflow in {:?} at {label:?}: content reaches {row_bottom:.1}mm on page {}, border ends at {estimated_bottom:.1}mm on page {start_page}",
                    block.title,
                    self.state.page_count
                );
                self.overflows.push(LayoutOverflow {
                    page: self.state.page_count,
                    section: block.title.clone(),
                    label: label.clone(),
                    estimated_bottom,
                    actual_bottom: row_bottom,
                });
            }
        }

        self.set_xy(x_start, estimated_bottom);
        self.gap(SECTION_TRAILING_GAP);
    }

    /// Two side-by-side signature cells on the current row. No reserve check
    /// of its own; the preceding section title is expected to have made room.
    pub fn signature_line(&mut self, label_a: &str, value_a: &str, label_b: &str, value_b: &str) {
        self.cell(
            SIGNATURE_CELL_WIDTH,
            SIGNATURE_CELL_HEIGHT,
            &format!("{label_a}: {value_a}"),
            SIGNATURE_TEXT,
            Alignment::Center,
            Advance::Right,
        );
        self.cell(
            SIGNATURE_CELL_WIDTH,
            SIGNATURE_CELL_HEIGHT,
            &format!("{label_b}: {value_b}"),
            SIGNATURE_TEXT,
            Alignment::Center,
            Advance::NextLine,
        );
    }

    /// Close the last page and assemble the PDF.
    pub fn finish(mut self) -> AgreementDocument {
        if self.state.page_count == 0 {
            self.new_page();
        }
        self.footer();
        self.flush_page();

        let bytes = assemble::write_pdf(&self.pages, &self.state.geometry, self.logo.as_ref());
        AgreementDocument {
            pages: self.pages,
            overflows: self.overflows,
            unencodable: self.unencodable,
            bytes,
        }
    }
}
