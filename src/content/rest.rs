/*!
 * JSON REST content store.
 *
 * Wire payloads are deserialized into loose `Wire*` structs and validated into the content
 * model here. Node kinds the pipeline does not translate (images, embeds, ...) are dropped;
 * malformed nodes fail the fetch with `StoreError::InvalidPayload`.
 */

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::errors::{ProviderError, StoreError};
use crate::http_client::RetryingHttpClient;

use super::model::{
    ContentNode, DocumentRef, FieldError, Locale, LocaleSet, PropertyOverride, PropertyUpdate, UpdatePayload, UpdateResponse,
};
use super::store::ContentStore;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProperty {
    #[serde(default)]
    property_id: Option<String>,
    #[serde(default)]
    text: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    node_type: String,
    #[serde(default)]
    text: Option<WireContent>,
    #[serde(default)]
    component_id: Option<String>,
    #[serde(default)]
    property_overrides: Vec<WireProperty>,
}

#[derive(Debug, Deserialize)]
struct WireNodes {
    #[serde(default)]
    nodes: Vec<WireNode>,
}

#[derive(Debug, Deserialize)]
struct WireProperties {
    #[serde(default)]
    properties: Vec<WireProperty>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLocale {
    id: String,
    tag: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    cms_locale_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLocales {
    primary: WireLocale,
    #[serde(default)]
    secondary: Vec<WireLocale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFieldError {
    #[serde(default)]
    node_id: Option<String>,
    #[serde(default)]
    property_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUpdateResponse {
    #[serde(default)]
    errors: Vec<WireFieldError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePropertyUpdate<'a> {
    property_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireUpdate<'a> {
    node_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    property_overrides: Option<Vec<WirePropertyUpdate<'a>>>,
}

impl<'a> From<&'a UpdatePayload> for WireUpdate<'a> {
    fn from(payload: &'a UpdatePayload) -> Self {
        match payload {
            UpdatePayload::Text { node_id, text } => Self {
                node_id,
                text: Some(text),
                property_overrides: None,
            },
            UpdatePayload::ComponentInstance { node_id, property_overrides } => Self {
                node_id,
                text: None,
                property_overrides: Some(property_overrides.iter().map(WirePropertyUpdate::from).collect()),
            },
        }
    }
}

impl<'a> From<&'a PropertyUpdate> for WirePropertyUpdate<'a> {
    fn from(update: &'a PropertyUpdate) -> Self {
        Self {
            property_id: &update.property_id,
            text: &update.text,
        }
    }
}

fn convert_property(property: WireProperty) -> Result<PropertyOverride, StoreError> {
    let property_id = property
        .property_id
        .ok_or_else(|| StoreError::InvalidPayload("property without propertyId".to_string()))?;
    let content = property.text.unwrap_or_default();
    Ok(PropertyOverride {
        property_id,
        text: content.text,
        html: content.html,
    })
}

/// Validate a wire node; `Ok(None)` for node kinds without translatable content
fn convert_node(node: WireNode) -> Result<Option<ContentNode>, StoreError> {
    let node_id = node
        .id
        .ok_or_else(|| StoreError::InvalidPayload(format!("{} node without id", node.node_type)))?;

    match node.node_type.as_str() {
        "text" => {
            let content = node.text.unwrap_or_default();
            Ok(Some(ContentNode::Text {
                node_id,
                text: content.text.unwrap_or_default(),
                html: content.html,
            }))
        }
        "component-instance" => {
            let component_id = node
                .component_id
                .ok_or_else(|| StoreError::InvalidPayload(format!("component instance {} without componentId", node_id)))?;
            let property_overrides = node
                .property_overrides
                .into_iter()
                .map(convert_property)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(ContentNode::ComponentInstance {
                node_id,
                component_id,
                property_overrides,
            }))
        }
        other => {
            debug!("Skipping {} node {}", other, node_id);
            Ok(None)
        }
    }
}

fn convert_locale(locale: WireLocale) -> Locale {
    Locale {
        display_name: locale.display_name.unwrap_or_else(|| locale.tag.clone()),
        id: locale.id,
        tag: locale.tag,
        cms_locale_id: locale.cms_locale_id,
    }
}

fn convert_response(response: WireUpdateResponse) -> Result<UpdateResponse, StoreError> {
    let errors = response
        .errors
        .into_iter()
        .map(|e| -> Result<FieldError, StoreError> {
            Ok(FieldError {
                node_id: e
                    .node_id
                    .ok_or_else(|| StoreError::InvalidPayload("field error without nodeId".to_string()))?,
                property_id: e.property_id,
                error: e.error.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(UpdateResponse { errors })
}

/// Content store reached over a JSON REST API with bearer authentication
#[derive(Clone)]
pub struct RestContentStore {
    client: RetryingHttpClient,
    base: Url,
    api_token: String,
}

impl fmt::Debug for RestContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestContentStore")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl RestContentStore {
    /// Create a store rooted at `endpoint`
    pub fn new(client: RetryingHttpClient, endpoint: &str, api_token: impl Into<String>) -> Result<Self, ProviderError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid store endpoint {}: {}", endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(ProviderError::RequestFailed(format!("Invalid store endpoint {}", endpoint)));
        }
        Ok(Self {
            client,
            base,
            api_token: api_token.into(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn document_url(&self, document: &DocumentRef) -> Url {
        match document {
            DocumentRef::Page(id) => self.url(&["pages", id, "dom"]),
            DocumentRef::Component(id) => self.url(&["components", id, "dom"]),
        }
    }

    async fn get<T: DeserializeOwned + Send>(&self, url: Url, query: &[(&str, &str)], what: &str) -> Result<T, StoreError> {
        debug!("GET {}", url);
        self.client
            .send_json(|c| c.get(url.clone()).bearer_auth(&self.api_token).query(query))
            .await
            .map_err(|e| store_error(e, what))
    }

    async fn post<B: Serialize + Sync>(&self, url: Url, query: &[(&str, &str)], body: &B, what: &str) -> Result<UpdateResponse, StoreError> {
        debug!("POST {}", url);
        let response: WireUpdateResponse = self
            .client
            .send_json(|c| c.post(url.clone()).bearer_auth(&self.api_token).query(query).json(body))
            .await
            .map_err(|e| store_error(e, what))?;
        convert_response(response)
    }
}

fn store_error(error: ProviderError, what: &str) -> StoreError {
    match error {
        ProviderError::NotFound(_) => StoreError::NotFound(what.to_string()),
        ProviderError::ParseError(message) => StoreError::InvalidPayload(message),
        other => StoreError::Http(other),
    }
}

fn query<'a>(locale_id: Option<&'a str>, branch: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut query = Vec::new();
    if let Some(locale_id) = locale_id {
        query.push(("localeId", locale_id));
    }
    if let Some(branch) = branch {
        query.push(("branch", branch));
    }
    query
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn get_document_nodes(
        &self,
        document: &DocumentRef,
        locale_id: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Vec<ContentNode>, StoreError> {
        let what = document.to_string();
        let wire: WireNodes = self.get(self.document_url(document), &query(locale_id, branch), &what).await?;
        let nodes: Vec<ContentNode> = wire
            .nodes
            .into_iter()
            .map(convert_node)
            .filter_map(Result::transpose)
            .collect::<Result<_, _>>()?;
        Ok(nodes)
    }

    async fn get_component_properties(
        &self,
        component_id: &str,
        branch: Option<&str>,
    ) -> Result<Vec<PropertyOverride>, StoreError> {
        let what = format!("properties of component {}", component_id);
        let url = self.url(&["components", component_id, "properties"]);
        let wire: WireProperties = self.get(url, &query(None, branch), &what).await?;
        wire.properties.into_iter().map(convert_property).collect()
    }

    async fn set_component_properties(
        &self,
        component_id: &str,
        locale_id: &str,
        properties: &[PropertyUpdate],
    ) -> Result<UpdateResponse, StoreError> {
        let what = format!("properties of component {}", component_id);
        let url = self.url(&["components", component_id, "properties"]);
        let body = serde_json::json!({
            "properties": properties.iter().map(WirePropertyUpdate::from).collect::<Vec<_>>(),
        });
        self.post(url, &query(Some(locale_id), None), &body, &what).await
    }

    async fn update_document(
        &self,
        document: &DocumentRef,
        locale_id: &str,
        updates: &[UpdatePayload],
    ) -> Result<UpdateResponse, StoreError> {
        let what = document.to_string();
        let body = serde_json::json!({
            "nodes": updates.iter().map(WireUpdate::from).collect::<Vec<_>>(),
        });
        self.post(self.document_url(document), &query(Some(locale_id), None), &body, &what).await
    }

    async fn get_locales(&self, site_id: &str) -> Result<LocaleSet, StoreError> {
        let what = format!("locales of site {}", site_id);
        let wire: WireLocales = self.get(self.url(&["sites", site_id, "locales"]), &[], &what).await?;
        Ok(LocaleSet {
            primary: convert_locale(wire.primary),
            secondary: wire.secondary.into_iter().map(convert_locale).collect(),
        })
    }
}
