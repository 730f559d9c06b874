/*!
 * Structural updates with corrective retry.
 *
 * The store validates the shape of rich text slots and rejects values that are not
 * wrapped in the element the slot expects, reporting errors such as "Expected p" per
 * node. The updater escapes and wraps the offending values in the expected tag and
 * resubmits them exactly once. Rejections that do not name an expected tag, and
 * rejections that survive the retry, are definitive failures.
 */

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::content::model::{DocumentRef, FieldError, PropertyUpdate, UpdatePayload, UpdateResponse};
use crate::content::store::ContentStore;
use crate::errors::{FieldFailure, StoreError};

/// The whole message is "Expected p", "Expected `<h2>`" or "expected 'li'"
static EXPECTED_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*expected\s+[`'"]?<?\s*([a-z][a-z0-9]*)\s*/?>?[`'"]?\s*\.?\s*$"#).unwrap()
});

/// Elements a rich text slot can require as its wrapper
const WRAPPER_ELEMENTS: &[&str] = &[
    "a", "article", "aside", "b", "blockquote", "code", "dd", "div", "dl", "dt", "em", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "i", "label", "li", "mark", "nav",
    "ol", "p", "pre", "s", "section", "small", "span", "strong", "sub", "sup", "table", "td", "th", "tr",
    "u", "ul",
];

/// Tag named by a structural validation message, if the message is exactly such a request
pub fn parse_expected_tag(message: &str) -> Option<String> {
    let tag = EXPECTED_TAG_REGEX.captures(message)?[1].to_ascii_lowercase();
    WRAPPER_ELEMENTS.contains(&tag.as_str()).then_some(tag)
}

/// Escape the characters with special meaning in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape the trimmed text and wrap it in `tag`
pub fn wrap_in_tag(text: &str, tag: &str) -> String {
    format!("<{tag}>{}</{tag}>", escape_html(text.trim()))
}

/// A tag correction requested for one slot of a payload
#[derive(Debug, Clone, PartialEq, Eq)]
struct Correction {
    property_id: Option<String>,
    tag: String,
}

/// A payload the updater knows how to correct
trait Correctable: Clone + Send + Sync {
    /// Key the store uses in its error reports
    fn key(&self) -> &str;

    /// Copy of the payload with the corrections applied, if any applied
    fn corrected(&self, corrections: &[Correction]) -> Option<Self>;
}

impl Correctable for UpdatePayload {
    fn key(&self) -> &str {
        self.node_id()
    }

    fn corrected(&self, corrections: &[Correction]) -> Option<Self> {
        match self {
            UpdatePayload::Text { node_id, text } => {
                let tag = &corrections.first()?.tag;
                Some(UpdatePayload::Text {
                    node_id: node_id.clone(),
                    text: wrap_in_tag(text, tag),
                })
            }
            UpdatePayload::ComponentInstance {
                node_id,
                property_overrides,
            } => {
                let mut applied = false;
                let property_overrides = property_overrides
                    .iter()
                    .map(|property| {
                        let correction = corrections.iter().find(|c| match &c.property_id {
                            Some(id) => *id == property.property_id,
                            None => true,
                        });
                        match correction {
                            Some(c) => {
                                applied = true;
                                PropertyUpdate {
                                    property_id: property.property_id.clone(),
                                    text: wrap_in_tag(&property.text, &c.tag),
                                }
                            }
                            None => property.clone(),
                        }
                    })
                    .collect();
                applied.then(|| UpdatePayload::ComponentInstance {
                    node_id: node_id.clone(),
                    property_overrides,
                })
            }
        }
    }
}

impl Correctable for PropertyUpdate {
    fn key(&self) -> &str {
        &self.property_id
    }

    fn corrected(&self, corrections: &[Correction]) -> Option<Self> {
        let tag = &corrections.first()?.tag;
        Some(PropertyUpdate {
            property_id: self.property_id.clone(),
            text: wrap_in_tag(&self.text, tag),
        })
    }
}

/// An update endpoint of the store
#[async_trait]
trait UpdateTarget<P: Correctable>: Send + Sync {
    async fn submit(&self, store: &dyn ContentStore, locale_id: &str, payloads: &[P]) -> Result<UpdateResponse, StoreError>;

    fn label(&self) -> String;
}

#[async_trait]
impl UpdateTarget<UpdatePayload> for DocumentRef {
    async fn submit(&self, store: &dyn ContentStore, locale_id: &str, payloads: &[UpdatePayload]) -> Result<UpdateResponse, StoreError> {
        store.update_document(self, locale_id, payloads).await
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

struct ComponentProperties<'a>(&'a str);

#[async_trait]
impl UpdateTarget<PropertyUpdate> for ComponentProperties<'_> {
    async fn submit(&self, store: &dyn ContentStore, locale_id: &str, payloads: &[PropertyUpdate]) -> Result<UpdateResponse, StoreError> {
        store.set_component_properties(self.0, locale_id, payloads).await
    }

    fn label(&self) -> String {
        format!("properties of component {}", self.0)
    }
}

/// Outcome of a successful update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Payloads submitted
    pub submitted: usize,
    /// Payloads accepted only after re-wrapping
    pub corrected: usize,
}

/// Writes translated content back to the store
pub struct StructuralUpdater<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> StructuralUpdater<'a> {
    /// Create an updater writing through `store`
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Apply node updates to one locale of a page or component
    pub async fn update_document(
        &self,
        document: &DocumentRef,
        locale_id: &str,
        updates: &[UpdatePayload],
    ) -> Result<UpdateReport, StoreError> {
        self.apply(document, locale_id, updates).await
    }

    /// Apply default property values to one locale of a component definition
    pub async fn update_component_properties(
        &self,
        component_id: &str,
        locale_id: &str,
        properties: &[PropertyUpdate],
    ) -> Result<UpdateReport, StoreError> {
        self.apply(&ComponentProperties(component_id), locale_id, properties).await
    }

    async fn apply<P, T>(&self, target: &T, locale_id: &str, payloads: &[P]) -> Result<UpdateReport, StoreError>
    where
        P: Correctable,
        T: UpdateTarget<P>,
    {
        if payloads.is_empty() {
            return Ok(UpdateReport::default());
        }

        let response = target.submit(self.store, locale_id, payloads).await?;
        if response.is_ok() {
            debug!("Updated {} fields of {} ({})", payloads.len(), target.label(), locale_id);
            return Ok(UpdateReport {
                submitted: payloads.len(),
                corrected: 0,
            });
        }

        let (retry, mut failures) = Self::plan_corrections(payloads, &response.errors);

        if !retry.is_empty() {
            warn!("{} fields of {} ({}) rejected by structural validation, retrying wrapped",
                  retry.len(), target.label(), locale_id);
            let retry_response = target.submit(self.store, locale_id, &retry).await?;
            failures.extend(retry_response.errors.iter().map(to_failure));
        }

        if failures.is_empty() {
            Ok(UpdateReport {
                submitted: payloads.len(),
                corrected: retry.len(),
            })
        } else {
            Err(StoreError::Structural {
                target: format!("{} ({})", target.label(), locale_id),
                failures,
            })
        }
    }

    /// Split store errors into corrected payloads to resubmit and definitive failures
    fn plan_corrections<P: Correctable>(payloads: &[P], errors: &[FieldError]) -> (Vec<P>, Vec<FieldFailure>) {
        let mut by_key: BTreeMap<&str, Vec<&FieldError>> = BTreeMap::new();
        for error in errors {
            by_key.entry(error.node_id.as_str()).or_default().push(error);
        }

        let mut retry = Vec::new();
        let mut failures = Vec::new();
        for (key, errors) in by_key {
            let corrections: Option<Vec<Correction>> = errors
                .iter()
                .map(|e| {
                    parse_expected_tag(&e.error).map(|tag| Correction {
                        property_id: e.property_id.clone(),
                        tag,
                    })
                })
                .collect();

            let corrected = corrections.and_then(|corrections| {
                payloads
                    .iter()
                    .find(|p| p.key() == key)
                    .and_then(|p| p.corrected(&corrections))
            });

            match corrected {
                Some(payload) => retry.push(payload),
                None => failures.extend(errors.into_iter().map(to_failure)),
            }
        }
        (retry, failures)
    }
}

fn to_failure(error: &FieldError) -> FieldFailure {
    FieldFailure {
        node_id: match &error.property_id {
            Some(property_id) => format!("{}/{}", error.node_id, property_id),
            None => error.node_id.clone(),
        },
        error: error.error.clone(),
    }
}
