/*!
 * Run-scoped state.
 *
 * A `RunContext` is created at the start of one sync run and passed explicitly to every
 * stage. It owns the outbound call counter and the in-run translation cache; both are
 * dropped when the run ends.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::content::model::{ContentNode, DocumentRef, LocaleSet, PropertyOverride, PropertyUpdate, UpdatePayload, UpdateResponse};
use crate::content::store::ContentStore;
use crate::errors::StoreError;
use crate::translation::cache::TranslationCache;

/// Counts outbound calls issued during a run
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Record one outbound call
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Calls recorded so far
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// State shared by every locale of one run
#[derive(Clone)]
pub struct RunContext {
    /// Identifier used in log lines
    pub run_id: Uuid,
    /// Outbound call counter
    pub calls: CallCounter,
    /// Translations produced during this run
    pub cache: TranslationCache,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Start a fresh run
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            calls: CallCounter::default(),
            cache: TranslationCache::new(),
        }
    }

    /// Wrap a store so every call it serves is counted against this run
    pub fn counted<'a>(&'a self, store: &'a dyn ContentStore) -> CountingStore<'a> {
        CountingStore {
            inner: store,
            calls: &self.calls,
        }
    }
}

/// Store decorator recording each call in a `CallCounter`
pub struct CountingStore<'a> {
    inner: &'a dyn ContentStore,
    calls: &'a CallCounter,
}

#[async_trait]
impl ContentStore for CountingStore<'_> {
    async fn get_document_nodes(
        &self,
        document: &DocumentRef,
        locale_id: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Vec<ContentNode>, StoreError> {
        self.calls.increment();
        self.inner.get_document_nodes(document, locale_id, branch).await
    }

    async fn get_component_properties(
        &self,
        component_id: &str,
        branch: Option<&str>,
    ) -> Result<Vec<PropertyOverride>, StoreError> {
        self.calls.increment();
        self.inner.get_component_properties(component_id, branch).await
    }

    async fn set_component_properties(
        &self,
        component_id: &str,
        locale_id: &str,
        properties: &[PropertyUpdate],
    ) -> Result<UpdateResponse, StoreError> {
        self.calls.increment();
        self.inner.set_component_properties(component_id, locale_id, properties).await
    }

    async fn update_document(
        &self,
        document: &DocumentRef,
        locale_id: &str,
        updates: &[UpdatePayload],
    ) -> Result<UpdateResponse, StoreError> {
        self.calls.increment();
        self.inner.update_document(document, locale_id, updates).await
    }

    async fn get_locales(&self, site_id: &str) -> Result<LocaleSet, StoreError> {
        self.calls.increment();
        self.inner.get_locales(site_id).await
    }
}
