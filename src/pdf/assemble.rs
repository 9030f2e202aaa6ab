use chrono::{Datelike, Timelike};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::fonts::{PT_PER_MM, font_entry, register_fonts, to_winansi_bytes};
use crate::model::{PageLayout, Placed};

use super::PageGeometry;
use super::layout::text_origin;
use super::logo::Logo;

const LOGO_NAME: &[u8] = b"Im1";
const RULE_WIDTH: f32 = 0.57; // 0.2mm

/// Serialise laid-out pages into a PDF byte stream.
pub(super) fn write_pdf(
    pages: &[PageLayout],
    geometry: &PageGeometry,
    logo: Option<&Logo>,
) -> Vec<u8> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let font_pairs = register_fonts(&mut pdf, &mut alloc);
    let logo_ref = logo.map(|l| {
        log::debug!("embedding logo {}", l.path.display());
        l.embed(&mut pdf, &mut alloc)
    });

    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in pages.iter().enumerate() {
        let raw = page_content(page, geometry).finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let (page_w, page_h) = (geometry.width * PT_PER_MM, geometry.height * PT_PER_MM);
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if let Some(xobj_ref) = logo_ref {
            resources.x_objects().pair(Name(LOGO_NAME), xobj_ref);
        }
    }

    let now = chrono::Local::now();
    pdf.document_info(info_id)
        .title(TextStr("Agent to Agent Agreement"))
        .producer(TextStr(concat!("agreement-pdf ", env!("CARGO_PKG_VERSION"))))
        .creation_date(
            pdf_writer::Date::new(now.year() as u16)
                .month(now.month() as u8)
                .day(now.day() as u8)
                .hour(now.hour() as u8)
                .minute(now.minute() as u8)
                .second(now.second() as u8),
        );

    let bytes = pdf.finish();
    log::info!(
        "Assembled {n} page(s) in {:.1}ms ({} bytes)",
        t0.elapsed().as_secs_f64() * 1000.0,
        bytes.len(),
    );
    bytes
}

/// Content stream for one page. Layout coordinates are millimetres from the
/// top-left; PDF space is points from the bottom-left.
fn page_content(page: &PageLayout, geometry: &PageGeometry) -> Content {
    let to_x = |mm: f32| mm * PT_PER_MM;
    let to_y = |mm: f32| (geometry.height - mm) * PT_PER_MM;

    let mut content = Content::new();
    content.set_line_width(RULE_WIDTH);

    for item in &page.items {
        match item {
            Placed::Text {
                x,
                y,
                width,
                height,
                text,
                style,
                alignment,
            } => {
                let (tx, baseline) = text_origin(*x, *y, *width, *height, text, *style, *alignment);
                let entry = font_entry(style.font);
                content.begin_text();
                content.set_font(Name(entry.pdf_name.as_bytes()), style.size);
                content.next_line(to_x(tx), to_y(baseline));
                content.show(Str(&to_winansi_bytes(text)));
                content.end_text();
            }
            Placed::Line { x1, y1, x2, y2 } => {
                content.move_to(to_x(*x1), to_y(*y1));
                content.line_to(to_x(*x2), to_y(*y2));
                content.stroke();
            }
            Placed::Rect { x, y, width, height } => {
                content.rect(
                    to_x(*x),
                    to_y(*y + *height),
                    *width * PT_PER_MM,
                    *height * PT_PER_MM,
                );
                content.stroke();
            }
            Placed::Logo { x, y, width, height } => {
                content.save_state();
                content.transform([
                    *width * PT_PER_MM,
                    0.0,
                    0.0,
                    *height * PT_PER_MM,
                    to_x(*x),
                    to_y(*y + *height),
                ]);
                content.x_object(Name(LOGO_NAME));
                content.restore_state();
            }
        }
    }
    content
}
