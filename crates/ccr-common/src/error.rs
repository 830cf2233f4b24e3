//! Error types for the CCR loader

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CCR operations
pub type Result<T> = std::result::Result<T, CcrError>;

/// Main error type for the CCR loader
///
/// Only run-level failures live here. Problems with a single input line are
/// reported, counted and skipped by the loader and never surface as a
/// `CcrError`.
#[derive(Error, Debug)]
pub enum CcrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot find input file: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = CcrError::FileNotFound {
            path: PathBuf::from("/data/ccr/ccrs.xchrom.v2.20180420.bed"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot find input file: /data/ccr/ccrs.xchrom.v2.20180420.bed"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err: CcrError = io.into();
        assert!(matches!(err, CcrError::Io(_)));
        assert!(err.to_string().contains("truncated"));
    }
}
