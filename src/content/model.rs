/*!
 * Content model shared by the traversal, extraction and update stages.
 *
 * Nodes and update payloads are explicit tagged variants; loosely typed store payloads
 * are converted into these types once, at the store boundary.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of an update target: a page or a reusable component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DocumentRef {
    /// A page document
    Page(String),
    /// A component definition
    Component(String),
}

impl DocumentRef {
    /// Identifier of the document within its kind
    pub fn id(&self) -> &str {
        match self {
            Self::Page(id) | Self::Component(id) => id,
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(id) => write!(f, "page {}", id),
            Self::Component(id) => write!(f, "component {}", id),
        }
    }
}

/// Per-instance override of a named slot on a reused component
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyOverride {
    /// Slot identifier
    pub property_id: String,
    /// Plain text value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Rich text value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl PropertyOverride {
    /// Markup representation when present, otherwise the plain text
    pub fn content(&self) -> Option<(&str, bool)> {
        preferred_content(self.text.as_deref(), self.html.as_deref())
    }
}

/// An addressable element of a document's structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentNode {
    /// A text run
    Text {
        /// Node identifier, unique within one fetched document
        node_id: String,
        /// Plain text content
        #[serde(default)]
        text: String,
        /// Rich text content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
    /// An instance of a reusable component
    ComponentInstance {
        /// Node identifier, unique within one fetched document
        node_id: String,
        /// The referenced component definition
        component_id: String,
        /// Per-instance slot overrides
        #[serde(default)]
        property_overrides: Vec<PropertyOverride>,
    },
}

impl ContentNode {
    /// Build a plain text node
    pub fn text(node_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            node_id: node_id.into(),
            text: text.into(),
            html: None,
        }
    }

    /// Build a rich text node
    pub fn html(node_id: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        Self::Text {
            node_id: node_id.into(),
            text: String::new(),
            html: Some(html),
        }
    }

    /// Build a component instance node
    pub fn instance(
        node_id: impl Into<String>,
        component_id: impl Into<String>,
        property_overrides: Vec<PropertyOverride>,
    ) -> Self {
        Self::ComponentInstance {
            node_id: node_id.into(),
            component_id: component_id.into(),
            property_overrides,
        }
    }

    /// Node identifier
    pub fn node_id(&self) -> &str {
        match self {
            Self::Text { node_id, .. } | Self::ComponentInstance { node_id, .. } => node_id,
        }
    }

    /// Referenced component, for component instances
    pub fn component_id(&self) -> Option<&str> {
        match self {
            Self::ComponentInstance { component_id, .. } => Some(component_id),
            Self::Text { .. } => None,
        }
    }
}

/// Pick the markup representation when present and non-empty, the plain text otherwise.
///
/// Returns the chosen content and whether it came from the markup field.
pub fn preferred_content<'a>(text: Option<&'a str>, html: Option<&'a str>) -> Option<(&'a str, bool)> {
    match (html, text) {
        (Some(html), _) if !html.is_empty() => Some((html, true)),
        (_, Some(text)) if !text.is_empty() => Some((text, false)),
        _ => None,
    }
}

/// A target language/region recognized by the content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Store identifier of the locale
    pub id: String,
    /// Language tag, e.g. `fr-FR`
    pub tag: String,
    /// Human readable name
    pub display_name: String,
    /// Identifier used for content-level localization; absent when disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cms_locale_id: Option<String>,
}

impl Locale {
    /// Whether content can be written for this locale
    pub fn is_translation_target(&self) -> bool {
        self.cms_locale_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Primary (source) and secondary (target) locales of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSet {
    /// Source language
    pub primary: Locale,
    /// Translation candidates
    #[serde(default)]
    pub secondary: Vec<Locale>,
}

impl LocaleSet {
    /// Secondary locales with content-level localization enabled
    pub fn targets(&self) -> Vec<Locale> {
        self.secondary
            .iter()
            .filter(|l| l.is_translation_target())
            .cloned()
            .collect()
    }
}

/// Where a translated unit must be written back
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OriginKey {
    /// A text node of a document
    Node {
        /// Owning document
        document: DocumentRef,
        /// Text node
        node_id: String,
    },
    /// A property override of a component instance
    InstanceProperty {
        /// Owning document
        document: DocumentRef,
        /// Component instance node
        node_id: String,
        /// Overridden slot
        property_id: String,
    },
    /// A default property value of a component definition
    ComponentProperty {
        /// Component definition
        component_id: String,
        /// Slot
        property_id: String,
    },
}

/// A piece of source content to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Trimmed core content sent to the backend
    pub source_text: String,
    /// Whether the content came from a markup field
    pub is_html: bool,
    /// Update target of the translation
    pub origin: OriginKey,
    /// Whitespace stripped from the start of the source
    pub leading: String,
    /// Whitespace stripped from the end of the source
    pub trailing: String,
}

impl TranslationUnit {
    /// Reattach the captured whitespace to a translated core
    pub fn reassemble(&self, translated: &str) -> String {
        format!("{}{}{}", self.leading, translated, self.trailing)
    }
}

/// A new value for a single slot of a component instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    /// Slot identifier
    pub property_id: String,
    /// Translated value
    pub text: String,
}

/// A single write against a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    /// Text node update
    Text {
        /// Target node
        node_id: String,
        /// Translated content
        text: String,
    },
    /// Component instance update
    ComponentInstance {
        /// Target instance node
        node_id: String,
        /// Translated slot values
        property_overrides: Vec<PropertyUpdate>,
    },
}

impl UpdatePayload {
    /// Target node of the update
    pub fn node_id(&self) -> &str {
        match self {
            Self::Text { node_id, .. } | Self::ComponentInstance { node_id, .. } => node_id,
        }
    }
}

/// A field the store rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending node (or property, for component property updates)
    pub node_id: String,
    /// Offending slot of a component instance, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// Store message, e.g. "Expected p"
    pub error: String,
}

/// Result of an update call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Per-field structural errors
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl UpdateResponse {
    /// Whether the store accepted every field
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
