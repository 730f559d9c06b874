/*!
 * Core translation service implementation.
 *
 * `TranslationService` owns the configured backend. A `LocaleTranslator` binds it to one
 * language pair and one run: plain-text calls go through the run's cache and are counted
 * against the run, markup goes through the tag-preserving tokenizer. Identical strings
 * requested concurrently share a single backend call.
 */

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use log::debug;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::providers::TranslationBackend;
use crate::sync::context::RunContext;

use super::cache::truncate_text;
use super::html::{HtmlPreservingTranslator, PlainTextTranslate};

/// Translation options for customizing the translation process
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Unique strings per batch
    pub batch_size: usize,

    /// Hint passed to the backend with every request
    pub context: Option<String>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            batch_size: 20,
            context: None,
        }
    }
}

/// Main translation service
#[derive(Clone)]
pub struct TranslationService {
    /// Backend implementation
    backend: Arc<dyn TranslationBackend>,

    /// Translation options
    pub options: TranslationOptions,
}

impl TranslationService {
    /// Create a new translation service around a backend
    pub fn new(backend: Arc<dyn TranslationBackend>, options: TranslationOptions) -> Self {
        Self { backend, options }
    }

    /// The backend requests are sent to
    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    /// Bind the service to a language pair within one run
    pub fn for_locale<'a>(&'a self, source_language: &str, target_language: &str, ctx: &'a RunContext) -> LocaleTranslator<'a> {
        LocaleTranslator {
            service: self,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            ctx,
        }
    }
}

/// Translation service bound to one language pair and one run
pub struct LocaleTranslator<'a> {
    service: &'a TranslationService,
    source_language: String,
    target_language: String,
    ctx: &'a RunContext,
}

impl LocaleTranslator<'_> {
    /// Target language tag
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translate text, preserving markup structure when it contains tags
    pub async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        HtmlPreservingTranslator::new(self).translate(text).await
    }

    /// Backend request for `text`, counted against the run once it is polled
    fn request(&self, text: &str) -> BoxFuture<'static, Result<String, TranslationError>> {
        let backend = Arc::clone(&self.service.backend);
        let calls = self.ctx.calls.clone();
        let context = self.service.options.context.clone();
        let text = text.to_string();
        let source_language = self.source_language.clone();
        let target_language = self.target_language.clone();

        async move {
            calls.increment();
            let translated = backend
                .translate(&text, &target_language, &source_language, context.as_deref())
                .await?;

            if translated.trim().is_empty() {
                return Err(TranslationError::EmptyResponse(truncate_text(&text, 40)));
            }

            debug!("Translated '{}' -> '{}' ({})",
                   truncate_text(&text, 30), truncate_text(&translated, 30), target_language);
            Ok(translated)
        }
        .boxed()
    }
}

#[async_trait]
impl PlainTextTranslate for LocaleTranslator<'_> {
    async fn translate_plain(&self, text: &str) -> Result<String, TranslationError> {
        let cache = &self.ctx.cache;
        if let Some(cached) = cache.get(text, &self.source_language, &self.target_language) {
            return Ok(cached);
        }

        cache
            .join_or_start(text, &self.source_language, &self.target_language, self.request(text))
            .await
    }
}
