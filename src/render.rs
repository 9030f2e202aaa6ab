use crate::error::Error;
use crate::model::{AgreementDocument, Alignment, FieldMap, SectionBlock};
use crate::pdf::{BODY_TEXT, Canvas, CanvasOptions};
use crate::template::{AgreementTemplate, FieldKind, FieldSpec};

const DATE_LINE_HEIGHT: f32 = 5.0;
const NOTICE_LINE_HEIGHT: f32 = 5.0;
const NOTICE_BLANK_GAP: f32 = 3.0;
const PART_GAP: f32 = 8.0;
const SIGNATURE_GAP: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ComposedPart {
    pub heading: String,
    pub blocks: Vec<SectionBlock>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComposedSignatures {
    pub heading: String,
    pub notice: Vec<String>,
    pub agent_a: (String, String),
    pub agent_b: (String, String),
}

/// Everything the canvas will draw, resolved from the field mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedAgreement {
    pub date: String,
    pub parts: Vec<ComposedPart>,
    pub signatures: ComposedSignatures,
}

/// Resolve the template against `fields`. Fails with `MissingField` before
/// anything is built.
pub fn compose(fields: &FieldMap, template: &AgreementTemplate) -> Result<ComposedAgreement, Error> {
    template.validate(fields)?;
    let schema = template.version;

    let date = FieldSpec::new("Date", template.date_key.as_str(), FieldKind::Date)
        .value(fields, schema)?
        .unwrap_or_default();

    let parts = template
        .parts()
        .into_iter()
        .map(|part| -> Result<ComposedPart, Error> {
            let blocks = part
                .sections
                .iter()
                .map(|section| section.compose(fields, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ComposedPart {
                heading: part.heading.clone(),
                blocks,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sig = &template.signatures;
    let signature = |(label, key): &(String, String)| -> Result<(String, String), Error> {
        let value = FieldSpec::text(label.as_str(), key.as_str())
            .value(fields, schema)?
            .unwrap_or_default();
        Ok((label.clone(), value))
    };

    Ok(ComposedAgreement {
        date,
        parts,
        signatures: ComposedSignatures {
            heading: sig.heading.clone(),
            notice: sig.notice.clone(),
            agent_a: signature(&sig.agent_a)?,
            agent_b: signature(&sig.agent_b)?,
        },
    })
}

/// Draw a composed agreement onto `canvas` in the fixed part order and
/// finish the document.
pub fn draw(mut canvas: Canvas, agreement: &ComposedAgreement) -> AgreementDocument {
    canvas.begin_document();

    canvas.text_line(
        &format!("Date: {}", agreement.date),
        BODY_TEXT,
        DATE_LINE_HEIGHT,
        Alignment::Right,
    );
    canvas.gap(PART_GAP);

    for part in &agreement.parts {
        canvas.section_title(&part.heading);
        for block in &part.blocks {
            canvas.bordered_section(block);
        }
        canvas.gap(PART_GAP);
    }

    let sig = &agreement.signatures;
    canvas.section_title(&sig.heading);
    for line in &sig.notice {
        if line.is_empty() {
            canvas.gap(NOTICE_BLANK_GAP);
        } else {
            canvas.text_line(line, BODY_TEXT, NOTICE_LINE_HEIGHT, Alignment::Left);
        }
    }
    canvas.gap(SIGNATURE_GAP);
    canvas.signature_line(&sig.agent_a.0, &sig.agent_a.1, &sig.agent_b.0, &sig.agent_b.1);

    canvas.finish()
}

/// Compose, build a fresh canvas and draw. The field mapping is validated
/// before the logo is loaded or anything is drawn.
pub fn render(
    fields: &FieldMap,
    template: &AgreementTemplate,
    options: &CanvasOptions,
) -> Result<AgreementDocument, Error> {
    let t0 = std::time::Instant::now();
    let agreement = compose(fields, template)?;
    let canvas = Canvas::new(options.clone())?;
    let doc = draw(canvas, &agreement);
    log::info!(
        "Rendered {} agreement: {} page(s), {} overflow warning(s), {} unencodable text(s) in {:.1}ms",
        template.version,
        doc.page_count(),
        doc.overflows.len(),
        doc.unencodable.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(doc)
}
