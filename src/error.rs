//! Error types for the mood-to-playlist pipeline and its remote collaborators.

use thiserror::Error;

/// Errors raised by the engine, the classifier adapter and the catalog gateway
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or blank text submitted for classification
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither the classifier output nor the mood hint mapped to a mood dimension
    #[error("No classifier label or mood hint maps to a mood dimension")]
    EmptyMood,

    /// Scoring was asked to rank an empty candidate pool
    #[error("Candidate pool is empty")]
    NoCandidates,

    /// Requested playlist length is not positive
    #[error("Invalid playlist length: {0}")]
    InvalidLength(usize),

    /// Network, auth or decoding failure talking to Spotify or the inference endpoint
    #[error("Remote service error: {0}")]
    RemoteService(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let url = response.get_url().to_string();
                let body = response.into_string().unwrap_or_default();
                Error::RemoteService(format!("{url} returned HTTP {code}: {}", body.trim()))
            }
            ureq::Error::Transport(transport) => Error::RemoteService(transport.to_string()),
        }
    }
}

/// Convenience Result type using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_condition() {
        assert_eq!(
            Error::InvalidLength(0).to_string(),
            "Invalid playlist length: 0"
        );
        assert_eq!(Error::NoCandidates.to_string(), "Candidate pool is empty");
        assert!(Error::RemoteService("timeout".into()).to_string().contains("timeout"));
    }

    #[test]
    fn test_json_errors_convert() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
