//! Error taxonomy shared by the loader, the ranking aggregator and the charts engine

use std::path::PathBuf;

#[derive(Debug)]
pub enum LoadError {
    /// One record could not be parsed or mapped onto its entity type
    MalformedRecord(String),
    /// A reference lacks its name or its id; dropped without a log line
    UnresolvedReference(String),
    /// A transactional batch could not be committed
    BatchWriteFailure(String),
    /// An input path is missing or unreadable
    SourceUnavailable { path: PathBuf, reason: String },
    /// A ranking period with nothing left to emit
    EmptyAggregation(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Csv(csv::Error),
    Database(String),
}

impl LoadError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LoadError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors stop the whole run, everything else is logged and counted
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::Database(_))
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json(err)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(err: serde_yaml::Error) -> Self {
        LoadError::Yaml(err)
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

impl From<rusqlite::Error> for LoadError {
    fn from(err: rusqlite::Error) -> Self {
        LoadError::Database(err.to_string())
    }
}

impl From<crate::store::StoreError> for LoadError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::Io(e) => LoadError::Io(e),
            crate::store::StoreError::Database(e) => LoadError::Database(e.to_string()),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            LoadError::UnresolvedReference(msg) => write!(f, "Unresolved reference: {}", msg),
            LoadError::BatchWriteFailure(msg) => write!(f, "Batch write failed: {}", msg),
            LoadError::SourceUnavailable { path, reason } => {
                write!(f, "Source unavailable <{}>: {}", path.display(), reason)
            }
            LoadError::EmptyAggregation(msg) => write!(f, "Nothing to aggregate: {}", msg),
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Json(e) => write!(f, "JSON error: {}", e),
            LoadError::Yaml(e) => write!(f, "YAML error: {}", e),
            LoadError::Csv(e) => write!(f, "CSV error: {}", e),
            LoadError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}
