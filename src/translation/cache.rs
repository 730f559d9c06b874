/*!
 * In-run translation cache.
 *
 * Holds translations produced during one sync run so identical strings (including
 * identical text tokens of different markup fragments) are only sent to the backend once.
 * The cache is owned by a single run and dropped with it; nothing is persisted.
 */

use futures::future::{self, BoxFuture, FutureExt, Shared};
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::TranslationError;

/// A backend request every caller asking for the same key awaits together
pub type PendingTranslation = Shared<BoxFuture<'static, Result<String, TranslationError>>>;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source text to translate
    source_text: String,

    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Translation cache for storing and retrieving translations
#[derive(Clone, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,

    /// Requests started but not finished yet
    pending: Arc<Mutex<HashMap<CacheKey, PendingTranslation>>>,
}

impl TranslationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        let key = CacheKey::new(source_text, source_language, target_language);
        match self.cache.read().get(&key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}' ({} -> {})",
                       truncate_text(source_text, 30), source_language, target_language);
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        let key = CacheKey::new(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Join the request in flight for this key, or start `request` for it.
    ///
    /// A started request stores a successful result before it stops being pending, so
    /// concurrent callers never issue the same request twice. Failures are not cached.
    pub fn join_or_start(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        request: BoxFuture<'static, Result<String, TranslationError>>,
    ) -> PendingTranslation {
        let key = CacheKey::new(source_text, source_language, target_language);
        let mut pending = self.pending.lock();
        if let Some(in_flight) = pending.get(&key) {
            debug!("Joining in-flight request for '{}' ({} -> {})",
                   truncate_text(source_text, 30), source_language, target_language);
            return in_flight.clone();
        }
        if let Some(translation) = self.cache.read().get(&key).cloned() {
            return future::ready(Ok(translation)).boxed().shared();
        }

        let cache = self.clone();
        let request_key = key.clone();
        let shared = async move {
            let result = request.await;
            if let Ok(translation) = &result {
                cache.cache.write().insert(request_key.clone(), translation.clone());
            }
            cache.pending.lock().remove(&request_key);
            result
        }
        .boxed()
        .shared();
        pending.insert(key, shared.clone());
        shared
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
