//! Remote signal clients
//!
//! - `HttpSpeechToText`: PCM16 audio in, transcript and confidence out
//! - `HttpTextAnalysis`: part-of-speech tokens, entities and key phrases
//!
//! Both implement the core service traits so analyzers can be tested with
//! mocks and deployed against the sidecars.

pub mod stt;
pub mod text_analysis;

pub use stt::{HttpSpeechToText, HttpSttConfig};
pub use text_analysis::{HttpTextAnalysis, HttpTextAnalysisConfig};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl PipelineError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            PipelineError::Timeout(timeout_ms)
        } else {
            PipelineError::Request(err.to_string())
        }
    }

    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        PipelineError::Status { status, body }
    }
}

pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client, PipelineError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| PipelineError::Client(format!("Failed to create HTTP client: {}", e)))
}
