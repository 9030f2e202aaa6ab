mod common;

use std::path::{Path, PathBuf};

use agreement_pdf::{
    AgreementConfig, Error, FieldValue, JsonLinesStore, LOGO_ENV, MemoryStore, OUTPUT_DIR_ENV,
    RecordId, RecordStore, SchemaVersion, submit, unique_output_path, write_document,
};

use common::{v1_fields, v2_fields};

fn config(logo: &Path, output_dir: &Path, schema: SchemaVersion) -> AgreementConfig {
    let mut config = AgreementConfig {
        schema,
        output_dir: output_dir.to_path_buf(),
        ..AgreementConfig::default()
    };
    config.letterhead.logo = logo.to_path_buf();
    config
}

#[test]
fn submission_stores_record_and_writes_pdf() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let logo = common::logo_fixture(dir.path());
    let out = dir.path().join("pdf_output");
    let config = config(&logo, &out, SchemaVersion::V2);

    let mut mem = MemoryStore::new();
    let store: &mut dyn RecordStore = &mut mem;
    let submission = submit(&v2_fields(), &config, Some(store)).unwrap();

    assert_eq!(submission.record_id, Some(RecordId(1)));
    assert!(submission.page_count >= 2);
    assert!(submission.unencodable.is_empty());
    assert_eq!(submission.pdf_path.parent(), Some(out.as_path()));
    let bytes = std::fs::read(&submission.pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let record = mem.get(RecordId(1)).unwrap();
    assert_eq!(record.fields["transfer_fee_paid_by"], serde_json::json!("buyer,seller"));
    assert_eq!(record.fields["property_mortgaged"], serde_json::json!(true));
    assert_eq!(record.fields["dated"], serde_json::json!("01/05/2024"));
}

#[test]
fn consecutive_submissions_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let logo = common::logo_fixture(dir.path());
    let config = config(&logo, &dir.path().join("out"), SchemaVersion::V1);

    let first = submit(&v1_fields(), &config, None).unwrap();
    let second = submit(&v1_fields(), &config, None).unwrap();
    assert_eq!(first.record_id, None);
    assert_ne!(first.pdf_path, second.pdf_path);
    assert!(first.pdf_path.exists() && second.pdf_path.exists());

    let names: Vec<PathBuf> = (0..50).map(|_| unique_output_path(dir.path())).collect();
    let mut deduped = names.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), names.len());
    for name in &names {
        let file = name.file_name().unwrap().to_string_lossy();
        assert!(file.starts_with("agreement_") && file.ends_with(".pdf"), "{file}");
    }
}

#[test]
fn missing_field_is_rejected_before_anything_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let logo = common::logo_fixture(dir.path());
    let out = dir.path().join("out");
    let config = config(&logo, &out, SchemaVersion::V2);
    let mut fields = v2_fields();
    fields.remove("buyer_name");

    let mut mem = MemoryStore::new();
    let err = submit(&fields, &config, Some(&mut mem)).unwrap_err();
    assert!(matches!(err, Error::MissingField { ref key, .. } if key == "buyer_name"));
    assert!(mem.records().is_empty());
    assert!(!out.exists());
}

#[test]
fn failed_write_leaves_record_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let logo = common::logo_fixture(dir.path());
    // A regular file where the output directory should be.
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"occupied").unwrap();
    let config = config(&logo, &blocker, SchemaVersion::V1);

    let mut mem = MemoryStore::new();
    let err = submit(&v1_fields(), &config, Some(&mut mem)).unwrap_err();
    assert!(matches!(err, Error::Sink { .. }), "got {err}");
    assert_eq!(mem.records().len(), 1);
}

#[test]
fn unreadable_logo_keeps_the_saved_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir.path().join("missing.png"), dir.path(), SchemaVersion::V1);

    let mut mem = MemoryStore::new();
    let err = submit(&v1_fields(), &config, Some(&mut mem)).unwrap_err();
    assert!(matches!(err, Error::Asset { .. }));
    assert_eq!(mem.records().len(), 1);
}

#[test]
fn json_lines_store_resumes_ids_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records").join("agreements.jsonl");

    let mut store = JsonLinesStore::open(&path).unwrap();
    assert_eq!(store.save(&v1_fields()).unwrap(), RecordId(1));
    assert_eq!(store.save(&v2_fields()).unwrap(), RecordId(2));

    let mut reopened = JsonLinesStore::open(&path).unwrap();
    assert_eq!(reopened.save(&v1_fields()).unwrap(), RecordId(3));

    let records = reopened.load_all().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![RecordId(1), RecordId(2), RecordId(3)]
    );
    assert_eq!(records[1].fields["transfer_fee_paid_by"], serde_json::json!("buyer,seller"));
    assert_eq!(records[0].fields["tenant_contacted_agent"], serde_json::json!(true));
    assert!(records[0].created_at <= records[2].created_at);
}

#[test]
fn submitted_keys_named_like_bookkeeping_columns_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreements.jsonl");
    let mut fields = v1_fields();
    fields.insert("id".into(), FieldValue::from("abc"));
    fields.insert("created_at".into(), FieldValue::from("yesterday"));

    let mut store = JsonLinesStore::open(&path).unwrap();
    assert_eq!(store.save(&fields).unwrap(), RecordId(1));

    let mut reopened = JsonLinesStore::open(&path).unwrap();
    assert_eq!(reopened.save(&fields).unwrap(), RecordId(2));
    let records = reopened.load_all().unwrap();
    assert_eq!(records[0].id, RecordId(1));
    assert_eq!(records[0].fields["id"], serde_json::json!("abc"));
    assert_eq!(records[1].fields["created_at"], serde_json::json!("yesterday"));
}

#[test]
fn two_handles_on_one_file_never_share_an_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreements.jsonl");

    let mut first = JsonLinesStore::open(&path).unwrap();
    let mut second = JsonLinesStore::open(&path).unwrap();
    assert_eq!(first.save(&v1_fields()).unwrap(), RecordId(1));
    assert_eq!(second.save(&v1_fields()).unwrap(), RecordId(2));
    assert_eq!(first.save(&v1_fields()).unwrap(), RecordId(3));
}

#[test]
fn concurrent_saves_get_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreements.jsonl");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || {
                let mut store = JsonLinesStore::open(&path).unwrap();
                store.save(&v1_fields()).unwrap()
            })
        })
        .collect();
    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap().0).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());

    let records = JsonLinesStore::open(&path).unwrap().load_all().unwrap();
    assert_eq!(records.len(), 8);
}

#[test]
fn corrupt_store_file_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreements.jsonl");
    std::fs::write(&path, "{\"id\": 1}\nnot json\n").unwrap();
    assert!(matches!(JsonLinesStore::open(&path), Err(Error::Store(_))));
}

#[test]
fn stored_form_joins_choices_with_commas() {
    let value = FieldValue::Choices(vec!["buyer".into(), "seller".into()]);
    assert_eq!(value.stored(), serde_json::json!("buyer,seller"));
    assert_eq!(value.display(), "buyer & seller");
    assert_eq!(FieldValue::Null.stored(), serde_json::Value::Null);
    assert_eq!(FieldValue::Flag(false).display(), "No");
}

#[test]
fn write_document_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("doc.pdf");
    write_document(b"%PDF-1.7 test", &path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn config_reads_toml_with_defaults() {
    let config = AgreementConfig::from_toml(
        r#"
schema = "v2"
output_dir = "out/agreements"

[letterhead]
title = "COMMISSION SHARING AGREEMENT"
logo = "assets/logo.jpg"
"#,
    )
    .unwrap();

    assert_eq!(config.schema, SchemaVersion::V2);
    assert_eq!(config.output_dir, PathBuf::from("out/agreements"));
    assert_eq!(config.store_path, None);
    assert_eq!(config.letterhead.title, "COMMISSION SHARING AGREEMENT");
    assert_eq!(config.letterhead.logo, PathBuf::from("assets/logo.jpg"));
    assert_eq!(
        config.letterhead.subtitle,
        "As per the Real Estate Brokers By-Law No. (85) of 2006"
    );
    assert_eq!(config.letterhead.footer_lines.len(), 2);

    assert!(AgreementConfig::from_toml("schema = \"v9\"").is_err());
}

#[test]
fn config_load_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agreement.toml");
    std::fs::write(&path, "output_dir = [").unwrap();
    match AgreementConfig::load(&path) {
        Err(Error::Config { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(matches!(
        AgreementConfig::load(&dir.path().join("absent.toml")),
        Err(Error::Config { .. })
    ));
}

#[test]
fn overrides_replace_logo_and_output_dir() {
    let config = AgreementConfig::default().with_overrides(|key| match key {
        k if k == LOGO_ENV => Some("/srv/brand/logo.png".to_string()),
        k if k == OUTPUT_DIR_ENV => Some("   ".to_string()),
        _ => None,
    });
    assert_eq!(config.letterhead.logo, PathBuf::from("/srv/brand/logo.png"));
    // Blank values are ignored.
    assert_eq!(config.output_dir, PathBuf::from("pdf_output"));
}
