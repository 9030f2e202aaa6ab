use std::path::PathBuf;
use std::process;

use clap::Parser;

use agreement_pdf::{
    AgreementConfig, Error, JsonLinesStore, RecordStore, SchemaVersion, UnencodableText,
};

/// Render an agent-to-agent agreement from a JSON field mapping.
#[derive(Parser)]
#[command(name = "agreement-pdf", version, about, long_about = None)]
struct Cli {
    /// JSON object mapping field names to values
    input: PathBuf,

    /// Output PDF path (defaults to a unique name in the output directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Field schema of the input (v1 lease, v2 sale)
    #[arg(short, long)]
    schema: Option<SchemaVersion>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Header logo image, overrides config and AGREEMENT_LOGO
    #[arg(long)]
    logo: Option<PathBuf>,

    /// JSON-lines record store to persist the submission in
    #[arg(long)]
    store: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => AgreementConfig::load(path)?,
        None => AgreementConfig::default(),
    }
    .with_env();
    if let Some(schema) = cli.schema {
        config.schema = schema;
    }
    if let Some(logo) = cli.logo {
        config.letterhead.logo = logo;
    }
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }

    let fields = agreement_pdf::read_field_map(&cli.input)?;

    match cli.output {
        Some(output) => {
            if let Some(path) = &config.store_path {
                agreement_pdf::AgreementTemplate::for_version(config.schema).validate(&fields)?;
                let id = JsonLinesStore::open(path)?.save(&fields)?;
                eprintln!("Stored record {id}");
            }
            let doc = agreement_pdf::render_agreement_to_file(&fields, &config, &output)?;
            report_unencodable(&doc.unencodable);
            eprintln!("Wrote {} ({} page(s))", output.display(), doc.page_count());
        }
        None => {
            let mut store = match &config.store_path {
                Some(path) => Some(JsonLinesStore::open(path)?),
                None => None,
            };
            let submission = agreement_pdf::submit(
                &fields,
                &config,
                store.as_mut().map(|s| s as &mut dyn RecordStore),
            )?;
            report_unencodable(&submission.unencodable);
            if let Some(id) = submission.record_id {
                eprintln!("Stored record {id}");
            }
            eprintln!(
                "Wrote {} ({} page(s))",
                submission.pdf_path.display(),
                submission.page_count
            );
        }
    }
    Ok(())
}

fn report_unencodable(reports: &[UnencodableText]) {
    for r in reports {
        eprintln!(
            "warning: page {}: {:?} lost {} character(s) outside the standard fonts",
            r.page,
            r.text,
            r.dropped.len()
        );
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
