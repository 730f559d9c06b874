/*!
 * Content tree traversal.
 *
 * Discovers every node reachable from a root document by following component instance
 * references. The traversal is an explicit worklist; the visited set lives in the returned
 * tree so it can be inspected after the walk.
 */

use log::debug;
use std::collections::{BTreeSet, VecDeque};

use crate::errors::StoreError;

use super::model::{ContentNode, DocumentRef, PropertyOverride};
use super::store::ContentStore;

/// The nodes of one fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    /// The document the nodes belong to
    pub document: DocumentRef,
    /// Nodes in store order
    pub nodes: Vec<ContentNode>,
}

/// Result of a traversal
#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    /// Root first, then components in discovery order
    pub documents: Vec<DocumentSnapshot>,
    /// Default property values of every visited component, in discovery order
    pub component_properties: Vec<(String, Vec<PropertyOverride>)>,
    /// Components fetched during the walk
    pub visited: BTreeSet<String>,
}

impl ContentTree {
    /// Flat view over every node of every document
    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.documents.iter().flat_map(|d| d.nodes.iter())
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        self.documents.iter().map(|d| d.nodes.len()).sum()
    }
}

/// Walks a document tree through a content store
pub struct ContentTreeWalker<'a> {
    store: &'a dyn ContentStore,
    branch: Option<&'a str>,
    fetch_component_properties: bool,
}

impl<'a> ContentTreeWalker<'a> {
    /// Create a walker reading the primary content of the given branch
    pub fn new(store: &'a dyn ContentStore, branch: Option<&'a str>) -> Self {
        Self {
            store,
            branch,
            fetch_component_properties: true,
        }
    }

    /// Skip fetching component default properties
    pub fn without_component_properties(mut self) -> Self {
        self.fetch_component_properties = false;
        self
    }

    /// Collect the root's nodes plus the nodes of every transitively referenced component.
    ///
    /// Each component is fetched at most once. Any fetch failure aborts the walk.
    pub async fn walk(&self, root: &DocumentRef) -> Result<ContentTree, StoreError> {
        let mut tree = ContentTree::default();
        let mut queue = VecDeque::from([root.clone()]);

        if let DocumentRef::Component(id) = root {
            tree.visited.insert(id.clone());
        }

        while let Some(document) = queue.pop_front() {
            let nodes = self.store.get_document_nodes(&document, None, self.branch).await?;
            debug!("Fetched {} nodes from {}", nodes.len(), document);

            for node in &nodes {
                if let Some(component_id) = node.component_id() {
                    if tree.visited.insert(component_id.to_string()) {
                        queue.push_back(DocumentRef::Component(component_id.to_string()));
                    }
                }
            }

            if let DocumentRef::Component(component_id) = &document {
                if self.fetch_component_properties {
                    let properties = self.store.get_component_properties(component_id, self.branch).await?;
                    tree.component_properties.push((component_id.clone(), properties));
                }
            }

            tree.documents.push(DocumentSnapshot { document, nodes });
        }

        Ok(tree)
    }
}
