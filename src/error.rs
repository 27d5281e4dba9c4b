//! Error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Dataset loading error type.
///
/// Loading is the only fallible step of the library: once a dataset is in
/// memory, filtering and aggregation are total and report data problems
/// through the quality report instead.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The dataset file could not be read
    #[error("failed to read dataset file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited text could not be parsed
    #[error("failed to parse dataset")]
    Csv(#[from] csv::Error),

    /// The file has no header row
    #[error("dataset contains no header row")]
    MissingHeader,

    /// None of the header names is a known column
    #[error("dataset header has no known column (delimiter '{delimiter}'): {header}")]
    UnrecognizedHeader { delimiter: char, header: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message() {
        let err = LoadError::Io {
            path: PathBuf::from("interventions2023.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read dataset file interventions2023.csv"
        );
    }

    #[test]
    fn test_unrecognized_header_message() {
        let err = LoadError::UnrecognizedHeader {
            delimiter: ';',
            header: "a,b,c".to_string(),
        };
        assert!(err.to_string().contains("delimiter ';'"));
        assert!(err.to_string().contains("a,b,c"));
    }
}
