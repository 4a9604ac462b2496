//! Speech-to-text trait

use async_trait::async_trait;

use crate::{AudioClip, Result, TranscriptResult};

/// Speech-to-Text interface
///
/// Used by the fluency analyzer when audio arrives without a transcript
/// confidence. Timeouts and retries belong to the implementation.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe a whole clip
    async fn transcribe(&self, audio: &AudioClip, language: &str) -> Result<TranscriptResult>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
