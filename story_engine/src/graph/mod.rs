//! Read-only graph view over a project document.
//!
//! The graph indexes nodes by id and the containment hierarchy by entry so
//! that traversal never has to scan packages.

use std::collections::HashMap;

use story_model::{Edge, HierarchyNode, Node, NodeKind, ProjectDocument};

use crate::error::AuthoringError;

/// Indexed view over a borrowed [`ProjectDocument`].
#[derive(Debug, Clone)]
pub struct StoryGraph<'doc> {
    document: &'doc ProjectDocument,

    /// Node id -> node.
    nodes: HashMap<&'doc str, &'doc Node>,

    /// Id -> hierarchy entry carrying that id.
    hierarchy: HashMap<&'doc str, &'doc HierarchyNode>,

    /// Child id -> parent id, from the hierarchy.
    parents: HashMap<&'doc str, &'doc str>,
}

impl<'doc> StoryGraph<'doc> {
    /// Index a document. Fails if two nodes share an id.
    pub fn new(document: &'doc ProjectDocument) -> Result<Self, AuthoringError> {
        let mut nodes = HashMap::with_capacity(document.node_count());
        for node in document.nodes() {
            if nodes.insert(node.id.as_str(), node).is_some() {
                return Err(AuthoringError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut hierarchy = HashMap::new();
        let mut parents = HashMap::new();
        for entry in document.hierarchy.walk() {
            hierarchy.entry(entry.id.as_str()).or_insert(entry);
            for child in &entry.children {
                parents
                    .entry(child.id.as_str())
                    .or_insert(entry.id.as_str());
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            hierarchy_entries = hierarchy.len(),
            "Indexed project document"
        );

        Ok(Self {
            document,
            nodes,
            hierarchy,
            parents,
        })
    }

    /// The underlying document.
    pub fn document(&self) -> &'doc ProjectDocument {
        self.document
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&'doc Node> {
        self.nodes.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing edges in canonical order: pin order, then connection order.
    pub fn edges(&self, node: &'doc Node) -> Vec<&'doc Edge> {
        node.edges().collect()
    }

    /// Resolve an edge to its target node.
    pub fn resolve_edge(&self, from: &Node, edge: &Edge) -> Result<&'doc Node, AuthoringError> {
        self.node(&edge.target_id)
            .ok_or_else(|| AuthoringError::DanglingEdge {
                from: from.id.clone(),
                target: edge.target_id.clone(),
            })
    }

    /// Targets of every outgoing edge, in canonical order.
    pub fn successors(&self, node: &'doc Node) -> Result<Vec<&'doc Node>, AuthoringError> {
        node.edges()
            .map(|edge| self.resolve_edge(node, edge))
            .collect()
    }

    /// First child of a node in the containment hierarchy.
    ///
    /// Hierarchy entries that are not nodes (folders, packages) are skipped.
    pub fn first_child(&self, node: &Node) -> Option<&'doc Node> {
        self.hierarchy
            .get(node.id.as_str())?
            .children
            .iter()
            .find_map(|child| self.node(&child.id))
    }

    /// Containing node, from the hierarchy or failing that the node's own
    /// parent reference.
    pub fn parent_of(&self, id: &str) -> Option<&'doc Node> {
        if let Some(parent) = self.parents.get(id).and_then(|parent| self.node(parent)) {
            return Some(parent);
        }
        self.node(id)?
            .parent_id
            .as_deref()
            .and_then(|parent| self.node(parent))
    }

    /// Whether nodes of `type_name` behave like `class_name`.
    ///
    /// Matches the type itself, its declared class, or the one type it
    /// directly inherits from. Longer inheritance chains are not followed.
    pub fn inherits_from(&self, type_name: &str, class_name: &str) -> bool {
        if type_name == class_name {
            return true;
        }
        self.document
            .object_definitions
            .iter()
            .filter(|definition| definition.type_name == type_name)
            .any(|definition| {
                definition.class == class_name
                    || definition.inherits_from.as_deref() == Some(class_name)
            })
    }

    /// Classify a node by its type tag, falling back to type definitions
    /// for custom template types.
    pub fn kind_of(&self, node: &Node) -> NodeKind {
        if let Some(kind) = NodeKind::from_type_name(&node.node_type) {
            return kind;
        }
        self.document
            .object_definitions
            .iter()
            .filter(|definition| definition.type_name == node.node_type)
            .find_map(|definition| {
                NodeKind::from_type_name(&definition.class).or_else(|| {
                    definition
                        .inherits_from
                        .as_deref()
                        .and_then(NodeKind::from_type_name)
                })
            })
            .unwrap_or_else(|| NodeKind::Unknown(node.node_type.clone()))
    }

    /// Every node carrying `marker`, in document order.
    pub fn start_candidates(&self, marker: &str) -> Vec<&'doc Node> {
        self.document
            .nodes()
            .filter(|node| node.mentions(marker))
            .collect()
    }

    /// Locate the entry point.
    ///
    /// With `strict` set, more than one marked node is an error; otherwise
    /// the first one in document order wins.
    pub fn find_start(&self, marker: &str, strict: bool) -> Result<&'doc Node, AuthoringError> {
        let candidates = self.start_candidates(marker);
        match candidates.as_slice() {
            [] => Err(AuthoringError::NoStartNode {
                marker: marker.to_string(),
            }),
            [only] => Ok(*only),
            [first, ..] => {
                let ids: Vec<String> = candidates.iter().map(|node| node.id.clone()).collect();
                if strict {
                    return Err(AuthoringError::MultipleStartNodes {
                        marker: marker.to_string(),
                        ids,
                    });
                }
                tracing::warn!(marker, candidates = ?ids, chosen = %first.id, "Several start markers found");
                Ok(*first)
            }
        }
    }

    /// Case-insensitive search over display name, text and expression.
    pub fn search(&self, query: &str) -> Vec<&'doc Node> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.document
            .nodes()
            .filter(|node| {
                [&node.display_name, &node.text, &node.expression]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
