//! Voice capture: Urdu speech-to-text and loan field extraction

pub mod extract;
pub mod transcribe;

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

pub use extract::{ExtractedLoanInfo, Extraction, LoanInfoExtractor};
pub use transcribe::{AudioUpload, Transcriber, Transcription};

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    InvalidInput(String),

    /// The provider answered, but not with something usable
    #[error("{message}")]
    Provider {
        message: String,
        details: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client bounded by `timeout`. Falling back to the default client loses
/// that bound, so the fallback is logged.
pub(crate) fn http_client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(
                error = %e,
                timeout_secs = timeout.as_secs(),
                "Failed to build HTTP client with timeout; provider calls are unbounded"
            );
            Client::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        let _client = http_client(Duration::from_secs(1));
    }
}
