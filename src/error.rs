use std::path::PathBuf;

use crate::template::SchemaVersion;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key referenced by the template is absent from the field mapping.
    #[error("field `{key}` is required by the {schema} template but was not supplied")]
    MissingField { key: String, schema: SchemaVersion },

    #[error("cannot read logo asset {}: {source}", .path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode logo asset {}: {reason}", .path.display())]
    AssetDecode { path: PathBuf, reason: String },

    #[error("cannot write document to {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record store failure: {0}")]
    Store(String),

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid field mapping: {0}")]
    Input(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
