use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;

/// Flat mapping of submitted form fields, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// One submitted value. JSON input maps `null`, booleans, strings and arrays
/// of strings onto `Null`, `Flag`, `Text` and `Choices`; `Date` is only
/// produced programmatically.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "JsonFieldValue")]
pub enum FieldValue {
    Null,
    Flag(bool),
    Text(String),
    Date(NaiveDate),
    Choices(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFieldValue {
    Null,
    Flag(bool),
    Text(String),
    Choices(Vec<String>),
}

impl From<JsonFieldValue> for FieldValue {
    fn from(raw: JsonFieldValue) -> Self {
        match raw {
            JsonFieldValue::Null => FieldValue::Null,
            JsonFieldValue::Flag(b) => FieldValue::Flag(b),
            JsonFieldValue::Text(s) => FieldValue::Text(s),
            JsonFieldValue::Choices(v) => FieldValue::Choices(v),
        }
    }
}

/// Separator used when a multi-select value is shown in the document.
pub const DISPLAY_CHOICE_SEPARATOR: &str = " & ";
/// Separator used when a multi-select value is persisted.
pub const STORED_CHOICE_SEPARATOR: &str = ",";

impl FieldValue {
    /// Text as it appears in a document cell. Null renders as "".
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Flag(true) => "Yes".to_string(),
            FieldValue::Flag(false) => "No".to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Choices(v) => v.join(DISPLAY_CHOICE_SEPARATOR),
        }
    }

    /// Value as written to the record store.
    pub fn stored(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Flag(b) => serde_json::Value::Bool(*b),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Choices(v) => serde_json::Value::String(v.join(STORED_CHOICE_SEPARATOR)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::Choices(v)
    }
}

pub fn parse_field_map(json: &str) -> Result<FieldMap, Error> {
    Ok(serde_json::from_str(json)?)
}

pub fn read_field_map(path: &Path) -> Result<FieldMap, Error> {
    let json = std::fs::read_to_string(path)?;
    parse_field_map(&json)
}

/// A titled bordered block of label/value rows, built from the field mapping
/// and consumed by the canvas right away.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionBlock {
    pub title: String,
    pub rows: Vec<(String, Option<String>)>,
}

impl SectionBlock {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, label: impl Into<String>, value: Option<String>) -> Self {
        self.rows.push((label.into(), value));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f32, // points
}

impl TextStyle {
    pub const fn new(font: FontStyle, size: f32) -> Self {
        Self { font, size }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// One item placed on a page. Coordinates are millimetres from the top-left
/// corner of the page.
#[derive(Clone, Debug, PartialEq)]
pub enum Placed {
    Text {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        text: String,
        style: TextStyle,
        alignment: Alignment,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
    pub number: usize,
    pub items: Vec<Placed>,
}

impl PageLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            Placed::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A value whose wrapped text ran past the height reserved for its block.
/// Recorded, never raised.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOverflow {
    pub page: usize,
    pub section: String,
    pub label: String,
    pub estimated_bottom: f32,
    pub actual_bottom: f32,
}

/// Text holding characters outside the WinAnsi code page of the standard
/// fonts. The characters are left out of the PDF; the full text stays in the
/// page layout.
#[derive(Clone, Debug, PartialEq)]
pub struct UnencodableText {
    pub page: usize,
    pub text: String,
    pub dropped: Vec<char>,
}

/// The finished agreement: the PDF bytes plus the per-page layout that
/// produced them.
#[derive(Clone, Debug)]
pub struct AgreementDocument {
    pub pages: Vec<PageLayout>,
    pub overflows: Vec<LayoutOverflow>,
    pub unencodable: Vec<UnencodableText>,
    pub bytes: Vec<u8>,
}

impl AgreementDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// First text item whose content equals `needle`, with its page number.
    pub fn find_text(&self, needle: &str) -> Option<(usize, &Placed)> {
        self.pages.iter().find_map(|page| {
            page.items
                .iter()
                .find(|item| matches!(item, Placed::Text { text, .. } if text == needle))
                .map(|item| (page.number, item))
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.find_text(needle).is_some()
    }
}
