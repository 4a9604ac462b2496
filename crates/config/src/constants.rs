//! Centralized constants for the assessment engine
//!
//! Single source of truth for service defaults and the documented fallback
//! values. Scoring weights live in [`crate::scoring`] because they are
//! tunable; the values here are not.

/// Documented fallback values substituted for unavailable signals
pub mod fallback {
    /// Partial score used when a remote critique is unavailable or malformed
    pub const PARTIAL_SCORE: f32 = 0.7;

    /// Baseline analyzer confidence before remote signals are counted
    pub const BASELINE_CONFIDENCE: f32 = 0.7;

    /// Pronunciation score when audio exists but no transcript confidence
    pub const PRONUNCIATION_SCORE: f32 = 0.7;
}

/// User-visible notices
pub mod messages {
    pub const NO_TEXT: &str = "No text provided for analysis";
    pub const AUDIO_TOO_SHORT: &str = "Audio too short for reliable analysis";
    pub const AUDIO_TEXT_MISMATCH: &str = "Mismatch between audio length and text";
}

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama LLM endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// OpenAI API endpoint
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Speech-to-text sidecar
    pub const STT_DEFAULT: &str = "http://localhost:8090";

    /// Syntax / entity / key-phrase sidecar
    pub const TEXT_ANALYSIS_DEFAULT: &str = "http://localhost:8091";
}

/// Timeouts (milliseconds)
pub mod timeouts {
    pub const LLM_REQUEST_MS: u64 = 20_000;
    pub const STT_REQUEST_MS: u64 = 10_000;
    pub const TEXT_ANALYSIS_REQUEST_MS: u64 = 5_000;
}

/// Audio defaults
pub mod audio {
    /// Default sample rate (Hz)
    pub const SAMPLE_RATE: u32 = 16000;
}
