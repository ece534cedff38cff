//! Error types for the trade validator.

use crate::types::Stream;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a stream could not be retrieved from its remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The source answered with a non-200 status.
    Status(u16),
    /// The body was not valid JSON (or not a list of records).
    InvalidJson,
    /// The request never completed.
    Network(String),
}

/// Main error type for the trade validator.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing request data).
    #[error("Data error: {0}")]
    Data(String),

    /// Tabular report could not be written.
    #[error("Report error: {0}")]
    Report(String),

    /// A stream could not be fetched.
    #[error("{}", fetch_message(.stream, .failure))]
    Fetch {
        stream: Stream,
        failure: FetchFailure,
    },

    /// The content store rejected an upload, delete or listing.
    #[error("Upload error: {0}")]
    Upload(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn fetch_message(stream: &Stream, failure: &FetchFailure) -> String {
    match failure {
        FetchFailure::Status(code) => format!("{} URL returned {}", stream, code),
        FetchFailure::InvalidJson => format!("{} URL does not contain valid JSON", stream),
        FetchFailure::Network(msg) => format!("Error fetching {}: {}", stream, msg),
    }
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a report error.
    pub fn report(msg: impl Into<String>) -> Self {
        Error::Report(msg.into())
    }

    /// Create a fetch error for one stream.
    pub fn fetch(stream: Stream, failure: FetchFailure) -> Self {
        Error::Fetch { stream, failure }
    }

    /// Create an upload error.
    pub fn upload(msg: impl Into<String>) -> Self {
        Error::Upload(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_messages_name_the_stream() {
        let err = Error::fetch(Stream::Pe, FetchFailure::Status(404));
        assert_eq!(err.to_string(), "PE URL returned 404");

        let err = Error::fetch(Stream::Index, FetchFailure::InvalidJson);
        assert_eq!(err.to_string(), "INDEX URL does not contain valid JSON");

        let err = Error::fetch(Stream::Ce, FetchFailure::Network("timed out".into()));
        assert_eq!(err.to_string(), "Error fetching CE: timed out");
    }
}
