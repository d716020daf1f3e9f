// errors.rs
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error belongs to. Used when logging and summarising a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Other,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract => write!(f, "extract"),
            Stage::Transform => write!(f, "transform"),
            Stage::Load => write!(f, "load"),
            Stage::Other => write!(f, "other"),
        }
    }
}

/// Errors raised by the ingestion pipeline and the tools around it.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("source file missing for '{source_id}': {}", .path.display())]
    MissingSource { source_id: String, path: PathBuf },

    #[error("source file for '{source_id}' is not valid CSV ({}): {reason}", .path.display())]
    InvalidFormat {
        source_id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("missing required columns for '{source_id}': {}", .missing.join(", "))]
    SchemaViolation {
        source_id: String,
        missing: Vec<String>,
    },

    #[error("no rows survived cleaning for '{source_id}' ({rows_in} rows in)")]
    EmptyResult { source_id: String, rows_in: usize },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("load failed, batch rolled back: {0}")]
    LoadFailure(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database not yet populated: {0}")]
    NotPopulated(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("xlsx export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    pub fn stage(&self) -> Stage {
        match self {
            EtlError::MissingSource { .. } | EtlError::InvalidFormat { .. } => Stage::Extract,
            EtlError::SchemaViolation { .. } | EtlError::EmptyResult { .. } => Stage::Transform,
            EtlError::StorageUnavailable(_) | EtlError::LoadFailure(_) => Stage::Load,
            _ => Stage::Other,
        }
    }

    /// Only an unreachable destination stops the whole run; everything else
    /// is scoped to the source being processed.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, EtlError::StorageUnavailable(_))
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(e: toml::de::Error) -> Self {
        EtlError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_unavailable_is_run_fatal() {
        assert!(EtlError::StorageUnavailable("gone".into()).is_run_fatal());
        assert!(!EtlError::LoadFailure("constraint".into()).is_run_fatal());
        assert!(!EtlError::EmptyResult {
            source_id: "cape_town".into(),
            rows_in: 3
        }
        .is_run_fatal());
    }

    #[test]
    fn schema_violation_names_missing_columns() {
        let err = EtlError::SchemaViolation {
            source_id: "johannesburg".into(),
            missing: vec!["price".into(), "room_type".into()],
        };
        assert_eq!(err.stage(), Stage::Transform);
        assert_eq!(
            err.to_string(),
            "missing required columns for 'johannesburg': price, room_type"
        );
    }
}
