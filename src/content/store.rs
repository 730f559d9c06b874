/*!
 * Content store collaborator interface.
 */

use async_trait::async_trait;

use crate::errors::StoreError;

use super::model::{ContentNode, DocumentRef, LocaleSet, PropertyOverride, PropertyUpdate, UpdatePayload, UpdateResponse};

/// Remote content service holding the document tree
///
/// Implementations validate wire payloads into the typed content model; the pipeline never
/// sees raw store JSON.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the nodes of a page or component, optionally for one locale and branch
    async fn get_document_nodes(
        &self,
        document: &DocumentRef,
        locale_id: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Vec<ContentNode>, StoreError>;

    /// Fetch the default property values of a component definition
    async fn get_component_properties(
        &self,
        component_id: &str,
        branch: Option<&str>,
    ) -> Result<Vec<PropertyOverride>, StoreError>;

    /// Write localized default property values of a component definition
    async fn set_component_properties(
        &self,
        component_id: &str,
        locale_id: &str,
        properties: &[PropertyUpdate],
    ) -> Result<UpdateResponse, StoreError>;

    /// Write localized content of a page or component
    async fn update_document(
        &self,
        document: &DocumentRef,
        locale_id: &str,
        updates: &[UpdatePayload],
    ) -> Result<UpdateResponse, StoreError>;

    /// Fetch the locales configured for a site
    async fn get_locales(&self, site_id: &str) -> Result<LocaleSet, StoreError>;
}
