/*!
 * Extraction of translation units from content nodes.
 */

use super::model::{preferred_content, ContentNode, DocumentRef, OriginKey, PropertyOverride, TranslationUnit};
use super::walker::ContentTree;
use crate::translation::html;

/// Zero-width and bidi control characters that render as nothing
pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{034F}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
    )
}

/// Whether a string carries nothing visible once invisible characters and whitespace are removed
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || is_invisible(c))
}

/// Split a string into leading whitespace, core, trailing whitespace
pub fn split_whitespace_edges(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

/// Converts content nodes into translation units
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeExtractor;

impl NodeExtractor {
    /// Units for one node of `document`
    pub fn extract(&self, document: &DocumentRef, node: &ContentNode) -> Vec<TranslationUnit> {
        match node {
            ContentNode::Text { node_id, text, html } => {
                let origin = OriginKey::Node {
                    document: document.clone(),
                    node_id: node_id.clone(),
                };
                preferred_content(Some(text.as_str()), html.as_deref())
                    .and_then(|(content, is_html)| Self::unit(content, is_html, origin))
                    .into_iter()
                    .collect()
            }
            ContentNode::ComponentInstance {
                node_id,
                property_overrides,
                ..
            } => property_overrides
                .iter()
                .filter_map(|property| {
                    let origin = OriginKey::InstanceProperty {
                        document: document.clone(),
                        node_id: node_id.clone(),
                        property_id: property.property_id.clone(),
                    };
                    let (content, is_html) = property.content()?;
                    Self::unit(content, is_html, origin)
                })
                .collect(),
        }
    }

    /// Units for the default property values of a component definition
    pub fn extract_component_properties(&self, component_id: &str, properties: &[PropertyOverride]) -> Vec<TranslationUnit> {
        properties
            .iter()
            .filter_map(|property| {
                let origin = OriginKey::ComponentProperty {
                    component_id: component_id.to_string(),
                    property_id: property.property_id.clone(),
                };
                let (content, is_html) = property.content()?;
                Self::unit(content, is_html, origin)
            })
            .collect()
    }

    /// Units for a whole traversal result, in tree order
    pub fn extract_tree(&self, tree: &ContentTree) -> Vec<TranslationUnit> {
        let mut units: Vec<TranslationUnit> = tree
            .documents
            .iter()
            .flat_map(|snapshot| snapshot.nodes.iter().flat_map(|node| self.extract(&snapshot.document, node)))
            .collect();
        for (component_id, properties) in &tree.component_properties {
            units.extend(self.extract_component_properties(component_id, properties));
        }
        units
    }

    fn unit(content: &str, is_html: bool, origin: OriginKey) -> Option<TranslationUnit> {
        if is_blank(content) {
            return None;
        }
        if is_html && !html::has_translatable_text(content) {
            return None;
        }
        let (leading, core, trailing) = split_whitespace_edges(content);
        Some(TranslationUnit {
            source_text: core.to_string(),
            is_html,
            origin,
            leading: leading.to_string(),
            trailing: trailing.to_string(),
        })
    }
}
