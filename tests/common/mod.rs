#![allow(dead_code)]

use std::path::{Path, PathBuf};

use agreement_pdf::pdf::{CanvasOptions, PageGeometry};
use agreement_pdf::{FieldMap, FieldValue, Letterhead, Placed, SectionBlock};

pub const EPS: f32 = 1e-3;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPS
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write a small opaque PNG logo (100x40 px) into `dir`.
pub fn logo_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("logo.png");
    let img = image::RgbaImage::from_pixel(100, 40, image::Rgba([20, 60, 120, 255]));
    img.save(&path).expect("write logo fixture");
    path
}

pub fn letterhead(logo: &Path) -> Letterhead {
    Letterhead {
        logo: logo.to_path_buf(),
        ..Letterhead::default()
    }
}

pub fn letterhead_options(logo: &Path) -> CanvasOptions {
    CanvasOptions {
        geometry: PageGeometry::a4(),
        letterhead: Some(letterhead(logo)),
    }
}

pub fn bare_options() -> CanvasOptions {
    CanvasOptions {
        geometry: PageGeometry::a4(),
        letterhead: None,
    }
}

pub fn block(title: &str, rows: usize) -> SectionBlock {
    (1..=rows).fold(SectionBlock::new(title), |b, i| {
        b.row(format!("Field {i}"), Some(format!("value {i}")))
    })
}

fn insert(fields: &mut FieldMap, pairs: &[(&str, &str)]) {
    for (k, v) in pairs {
        fields.insert(k.to_string(), FieldValue::from(*v));
    }
}

fn agent(fields: &mut FieldMap, prefix: &str, name: &str) {
    let key = |s: &str| format!("{prefix}_{s}");
    for (k, v) in [
        ("establishment", format!("{name} Properties LLC")),
        ("address", "Office 12, Bur Dubai".to_string()),
        ("phone", "+971 4 000 0000".to_string()),
        ("fax", "+971 4 000 0001".to_string()),
        ("email", format!("info@{}.ae", name.to_lowercase())),
        ("orn", "12345".to_string()),
        ("license", "LIC-998".to_string()),
        ("po_box", "118163".to_string()),
        ("emirates", "Dubai".to_string()),
        ("name", format!("{name} Agent")),
        ("brn", "BRN-42".to_string()),
        ("date_issued", "2024-01-01".to_string()),
        ("mobile", "+971 50 000 0000".to_string()),
        ("email_personal", format!("agent@{}.ae", name.to_lowercase())),
        ("signature", format!("{name} Agent")),
    ] {
        fields.insert(key(k), FieldValue::Text(v));
    }
}

/// A complete schema v1 (lease) submission.
pub fn v1_fields() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("dated".into(), FieldValue::from("2024-05-01"));
    agent(&mut fields, "agent_a", "Alpha");
    agent(&mut fields, "agent_b", "Beta");
    insert(
        &mut fields,
        &[
            ("property_address", "Unit 1204, Marina Heights"),
            ("master_developer", "Emaar"),
            ("master_project", "Dubai Marina"),
            ("building_name", "Marina Heights"),
            ("listed_price", "AED 120,000"),
            ("property_description", "Two bedroom apartment"),
            ("landlord_agent_percent", "50"),
            ("tenant_agent_percent", "50"),
            ("tenant_name", "Jordan Smith"),
            ("tenant_passport", "P1234567"),
            ("tenant_budget", "AED 125,000"),
            ("transfer_fee_paid_by", "tenant"),
        ],
    );
    fields.insert("tenant_contacted_agent".into(), FieldValue::Flag(true));
    fields
}

/// A complete schema v2 (sale) submission.
pub fn v2_fields() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("dated".into(), FieldValue::from("01/05/2024"));
    agent(&mut fields, "agent_a", "Gamma");
    agent(&mut fields, "agent_b", "Delta");
    insert(
        &mut fields,
        &[
            ("property_address", "Villa 7, Palm Jumeirah"),
            ("master_developer", "Nakheel"),
            ("master_project", "Palm Jumeirah"),
            ("building_name", "Frond K"),
            ("listed_price", "AED 9,500,000"),
            ("property_description", "Five bedroom villa with private beach"),
            ("seller_agent_percent", "1"),
            ("buyer_agent_percent", "1"),
            ("buyer_name", "Sam Taylor"),
            ("buyer_passport", "X7654321"),
            ("buyer_budget", "AED 10,000,000"),
            ("buyer_contacted_agent", "no"),
        ],
    );
    fields.insert("property_tenanted".into(), FieldValue::Flag(false));
    fields.insert("property_mortgaged".into(), FieldValue::Flag(true));
    fields.insert(
        "transfer_fee_paid_by".into(),
        FieldValue::Choices(vec!["buyer".into(), "seller".into()]),
    );
    fields
}

/// Position of the first text item equal to `text` on `items`.
pub fn text_position(items: &[Placed], text: &str) -> Option<(f32, f32)> {
    items.iter().find_map(|item| match item {
        Placed::Text { x, y, text: t, .. } if t == text => Some((*x, *y)),
        _ => None,
    })
}

pub fn rects(items: &[Placed]) -> Vec<(f32, f32, f32, f32)> {
    items
        .iter()
        .filter_map(|item| match item {
            Placed::Rect { x, y, width, height } => Some((*x, *y, *width, *height)),
            _ => None,
        })
        .collect()
}
