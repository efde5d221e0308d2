use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors. Anything recoverable (zero denominators, empty filters,
/// malformed values) is carried as `Option` or a page `Notice` instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("data file not found: {file}")]
    MissingDataFile { file: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unknown page: {0}")]
    UnknownPage(String),
}

impl DashboardError {
    /// File name of a missing input, if that is what failed.
    pub fn missing_file(&self) -> Option<&str> {
        match self {
            DashboardError::MissingDataFile { file } => Some(file),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::MissingDataFile { .. } => "missing_data_file",
            DashboardError::Io { .. } => "io",
            DashboardError::Csv { .. } => "csv",
            DashboardError::UnknownPage(_) => "unknown_page",
        }
    }
}
