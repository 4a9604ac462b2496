//! Syntactic / entity / key-phrase analysis trait

use async_trait::async_trait;

use crate::{Entity, KeyPhrase, Result, SyntaxToken};

/// External text-analysis service
///
/// Each call is independent so analyzers can issue them concurrently and
/// survive any single failure.
#[async_trait]
pub trait TextAnalysisService: Send + Sync + 'static {
    /// Token-level part-of-speech tags
    async fn analyze_syntax(&self, text: &str, language: &str) -> Result<Vec<SyntaxToken>>;

    /// Named entities
    async fn detect_entities(&self, text: &str, language: &str) -> Result<Vec<Entity>>;

    /// Key phrases
    async fn detect_key_phrases(&self, text: &str, language: &str) -> Result<Vec<KeyPhrase>>;

    /// Service name for logging
    fn service_name(&self) -> &str;
}
