use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the record store and the report pipeline.
///
/// Only `ExternalLookup` is recoverable: the uploader aggregation swallows it
/// and degrades to an empty top-uploaders list. Everything else aborts the run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no video metadata files found in {}", dir.display())]
    MissingData { dir: PathBuf },

    #[error("failed to parse video metadata file {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("channel lookup failed: {0}")]
    ExternalLookup(String),

    #[error("not enough data to compute {computation}")]
    InsufficientData { computation: &'static str },

    #[error("cache snapshot {} is unusable: {reason}", path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AnalysisError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn insufficient(computation: &'static str) -> Self {
        Self::InsufficientData { computation }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_names_the_computation() {
        let err = AnalysisError::insufficient("most viewed video");
        assert_eq!(err.to_string(), "not enough data to compute most viewed video");
    }

    #[test]
    fn malformed_record_includes_path() {
        let err = AnalysisError::malformed("raw/00003.info.json", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("raw/00003.info.json"));
        assert!(msg.contains("expected value"));
    }
}
