/*!
 * In-memory content store.
 *
 * Holds documents, component properties and locales in process memory and records every
 * write. Slots can be given a required wrapping tag, in which case writes that are not
 * wrapped in that tag are rejected the way a real store rejects rich text sent to a
 * paragraph slot. Used by tests and dry runs.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::errors::StoreError;

use super::model::{
    ContentNode, DocumentRef, FieldError, LocaleSet, PropertyOverride, PropertyUpdate, UpdatePayload,
    UpdateResponse,
};
use super::store::ContentStore;

/// A write accepted by the memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    /// `update_document` call
    Document {
        /// Target document
        document: DocumentRef,
        /// Locale written
        locale_id: String,
        /// Submitted payloads
        updates: Vec<UpdatePayload>,
    },
    /// `set_component_properties` call
    ComponentProperties {
        /// Target component
        component_id: String,
        /// Locale written
        locale_id: String,
        /// Submitted values
        properties: Vec<PropertyUpdate>,
    },
}

#[derive(Default)]
struct State {
    documents: HashMap<DocumentRef, Vec<ContentNode>>,
    component_properties: HashMap<String, Vec<PropertyOverride>>,
    locales: HashMap<String, LocaleSet>,
    required_tags: HashMap<String, String>,
    always_reject: HashSet<String>,
    fetch_counts: HashMap<DocumentRef, usize>,
    writes: Vec<RecordedWrite>,
}

/// Content store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn with_document(self, document: DocumentRef, nodes: Vec<ContentNode>) -> Self {
        self.state.lock().documents.insert(document, nodes);
        self
    }

    /// Add default property values for a component
    pub fn with_component_properties(self, component_id: &str, properties: Vec<PropertyOverride>) -> Self {
        self.state
            .lock()
            .component_properties
            .insert(component_id.to_string(), properties);
        self
    }

    /// Add the locales of a site
    pub fn with_locales(self, site_id: &str, locales: LocaleSet) -> Self {
        self.state.lock().locales.insert(site_id.to_string(), locales);
        self
    }

    /// Require writes to a node (or property) to be wrapped in `tag`
    pub fn with_required_tag(self, node_id: &str, tag: &str) -> Self {
        self.state
            .lock()
            .required_tags
            .insert(node_id.to_string(), tag.to_string());
        self
    }

    /// Reject every write to a node with a message the corrective retry cannot handle
    pub fn with_rejected_node(self, node_id: &str) -> Self {
        self.state.lock().always_reject.insert(node_id.to_string());
        self
    }

    /// Every accepted write, in call order
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    /// Number of `get_document_nodes` calls made for a document
    pub fn fetch_count(&self, document: &DocumentRef) -> usize {
        self.state.lock().fetch_counts.get(document).copied().unwrap_or(0)
    }

    fn validate(state: &State, node_id: &str, property_id: Option<&str>, text: &str) -> Option<FieldError> {
        let key = property_id.unwrap_or(node_id);
        if state.always_reject.contains(key) {
            return Some(FieldError {
                node_id: node_id.to_string(),
                property_id: property_id.map(str::to_string),
                error: "Invalid value".to_string(),
            });
        }
        let tag = state.required_tags.get(key)?;
        let open = format!("<{}>", tag);
        let close = format!("</{}>", tag);
        if text.starts_with(&open) && text.ends_with(&close) {
            None
        } else {
            Some(FieldError {
                node_id: node_id.to_string(),
                property_id: property_id.map(str::to_string),
                error: format!("Expected {}", tag),
            })
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_document_nodes(
        &self,
        document: &DocumentRef,
        _locale_id: Option<&str>,
        _branch: Option<&str>,
    ) -> Result<Vec<ContentNode>, StoreError> {
        let mut state = self.state.lock();
        *state.fetch_counts.entry(document.clone()).or_default() += 1;
        state
            .documents
            .get(document)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(document.to_string()))
    }

    async fn get_component_properties(
        &self,
        component_id: &str,
        _branch: Option<&str>,
    ) -> Result<Vec<PropertyOverride>, StoreError> {
        Ok(self
            .state
            .lock()
            .component_properties
            .get(component_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_component_properties(
        &self,
        component_id: &str,
        locale_id: &str,
        properties: &[PropertyUpdate],
    ) -> Result<UpdateResponse, StoreError> {
        let mut state = self.state.lock();
        let mut errors = Vec::new();
        let mut accepted = Vec::new();
        for property in properties {
            match Self::validate(&state, &property.property_id, None, &property.text) {
                Some(error) => errors.push(error),
                None => accepted.push(property.clone()),
            }
        }
        if !accepted.is_empty() {
            state.writes.push(RecordedWrite::ComponentProperties {
                component_id: component_id.to_string(),
                locale_id: locale_id.to_string(),
                properties: accepted,
            });
        }
        Ok(UpdateResponse { errors })
    }

    async fn update_document(
        &self,
        document: &DocumentRef,
        locale_id: &str,
        updates: &[UpdatePayload],
    ) -> Result<UpdateResponse, StoreError> {
        let mut state = self.state.lock();
        if !state.documents.contains_key(document) {
            return Err(StoreError::NotFound(document.to_string()));
        }
        let mut errors = Vec::new();
        let mut accepted = Vec::new();
        for update in updates {
            let before = errors.len();
            match update {
                UpdatePayload::Text { node_id, text } => {
                    errors.extend(Self::validate(&state, node_id, None, text));
                }
                UpdatePayload::ComponentInstance { node_id, property_overrides } => {
                    for property in property_overrides {
                        errors.extend(Self::validate(&state, node_id, Some(&property.property_id), &property.text));
                    }
                }
            }
            if errors.len() == before {
                accepted.push(update.clone());
            }
        }
        if !accepted.is_empty() {
            state.writes.push(RecordedWrite::Document {
                document: document.clone(),
                locale_id: locale_id.to_string(),
                updates: accepted,
            });
        }
        Ok(UpdateResponse { errors })
    }

    async fn get_locales(&self, site_id: &str) -> Result<LocaleSet, StoreError> {
        self.state
            .lock()
            .locales
            .get(site_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("site {}", site_id)))
    }
}
