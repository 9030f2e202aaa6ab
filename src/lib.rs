mod config;
mod error;
mod fonts;
mod model;
pub mod pdf;
mod render;
mod sink;
mod store;
mod template;

pub use config::{AgreementConfig, LOGO_ENV, Letterhead, OUTPUT_DIR_ENV};
pub use error::Error;
pub use model::{
    AgreementDocument, Alignment, DISPLAY_CHOICE_SEPARATOR, FieldMap, FieldValue, FontStyle,
    LayoutOverflow, PageLayout, Placed, STORED_CHOICE_SEPARATOR, SectionBlock, TextStyle,
    UnencodableText, parse_field_map, read_field_map,
};
pub use render::{ComposedAgreement, ComposedPart, ComposedSignatures, compose, draw, render};
pub use sink::{unique_output_path, write_document};
pub use store::{JsonLinesStore, MemoryStore, RecordId, RecordStore, StoredRecord};
pub use template::{
    AgreementTemplate, FieldKind, FieldSource, FieldSpec, PartTemplate, SchemaVersion,
    SectionTemplate, SignatureTemplate,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of a successful submission.
#[derive(Clone, Debug)]
pub struct Submission {
    pub record_id: Option<RecordId>,
    pub pdf_path: PathBuf,
    pub page_count: usize,
    /// Text the standard fonts could not show in full.
    pub unencodable: Vec<UnencodableText>,
}

/// Render `fields` with the configured schema and letterhead and write the
/// PDF to `output`.
pub fn render_agreement_to_file(
    fields: &FieldMap,
    config: &AgreementConfig,
    output: &Path,
) -> Result<AgreementDocument, Error> {
    let t0 = Instant::now();
    let template = AgreementTemplate::for_version(config.schema);
    let doc = render(fields, &template, &config.canvas_options())?;
    let t_render = t0.elapsed();

    write_document(&doc.bytes, output)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.bytes.len(),
    );
    Ok(doc)
}

/// Persist then render. The record is saved first and is not rolled back
/// if rendering or writing fails afterwards. Missing template keys are
/// rejected before anything is saved.
pub fn submit(
    fields: &FieldMap,
    config: &AgreementConfig,
    store: Option<&mut dyn RecordStore>,
) -> Result<Submission, Error> {
    let t0 = Instant::now();
    let template = AgreementTemplate::for_version(config.schema);
    template.validate(fields)?;

    let record_id = match store {
        Some(store) => Some(store.save(fields)?),
        None => None,
    };
    let t_store = t0.elapsed();

    let doc = render(fields, &template, &config.canvas_options())?;
    let t_render = t0.elapsed();

    let pdf_path = unique_output_path(&config.output_dir);
    write_document(&doc.bytes, &pdf_path)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: store={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({} -> {})",
        t_store.as_secs_f64() * 1000.0,
        (t_render - t_store).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        record_id.map_or_else(|| "unsaved".to_string(), |id| format!("record {id}")),
        pdf_path.display(),
    );

    Ok(Submission {
        record_id,
        pdf_path,
        page_count: doc.page_count(),
        unencodable: doc.unencodable,
    })
}
