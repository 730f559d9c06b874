/*!
 * Translation backend implementations.
 *
 * This module contains client implementations for the supported LLM backends:
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 * - Mock: deterministic in-process backend for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::language_utils::display_language;

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must follow,
/// allowing them to be used interchangeably by the sync pipeline.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate a single tag-free string
    ///
    /// # Arguments
    /// * `text` - Trimmed text to translate
    /// * `target_language` - Language name or tag to translate into
    /// * `source_language` - Language name or tag of the text
    /// * `context` - Optional hint about where the text appears
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the instruction sent with every translation request
///
/// Locale tags are resolved to language names (`fr-CA` -> `French (CA)`).
pub fn build_system_prompt(template: &str, source_language: &str, target_language: &str, context: Option<&str>) -> String {
    let mut prompt = template
        .replace("{source_language}", &display_language(source_language))
        .replace("{target_language}", &display_language(target_language));
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        prompt.push_str(&format!(" The text appears on: {}.", context));
    }
    prompt
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
