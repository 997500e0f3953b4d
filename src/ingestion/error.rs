//! Error taxonomy for the ingestion pipeline
//!
//! Field quirks (blank names, unknown diameters, placeholder numbers) are not
//! errors: they are normalized in `utils`. Only structural problems with a
//! source and serializing an unlinked approach end up here.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IngestionError>;

/// Structural mismatch in an input source. Aborts the load.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("missing required column `{column}` in CSV header")]
    MissingColumn { column: String },

    #[error("missing required key `{key}` in JSON document")]
    MissingKey { key: String },

    #[error("key `{key}` has the wrong shape: {detail}")]
    InvalidKey { key: String, detail: String },

    #[error("missing required field `{field}` in declared field list")]
    MissingField { field: String },

    #[error("row {row}: expected {expected} values, found {found}")]
    FieldCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: {detail}")]
    MalformedRow { row: usize, detail: String },

    #[error("expected {expected} source, got {found}")]
    UnexpectedSource {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A close approach reached the serializer without a resolved NEO.
    #[error("linkage error: close approach of '{designation}' at '{time}' has no linked NEO")]
    Linkage { designation: String, time: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to finalize output file {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    pub fn is_format(&self) -> bool {
        matches!(self, IngestionError::Format(_))
    }

    pub fn is_linkage(&self) -> bool {
        matches!(self, IngestionError::Linkage { .. })
    }
}
