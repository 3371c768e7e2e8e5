//! The normalized project document produced by a document loader.
//!
//! The loader is responsible for format detection, multi-file assembly and
//! text-reference resolution. By the time a [`ProjectDocument`] exists every
//! field holds literal strings and the document is immutable.

mod node;

pub use node::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variables::Value;

/// Errors raised while reading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid project document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A global variable declaration with its starting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub name: String,
    pub initial_value: Value,
}

/// A named group of global variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
        }
    }

    /// Declare a variable in this namespace.
    pub fn with_variable(mut self, name: impl Into<String>, initial_value: impl Into<Value>) -> Self {
        self.variables.push(VariableDefinition {
            name: name.into(),
            initial_value: initial_value.into(),
        });
        self
    }
}

/// A package of nodes. Node ids are unique across all packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }
}

/// Type metadata: which class a node type belongs to and what it extends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
}

impl TypeDef {
    pub fn new(type_name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            class: class.into(),
            inherits_from: None,
        }
    }

    pub fn with_inherits_from(mut self, parent: impl Into<String>) -> Self {
        self.inherits_from = Some(parent.into());
        self
    }
}

/// One entry of the containment tree. Children are kept in authoring order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: HierarchyNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first walk over this entry and all its descendants.
    pub fn walk(&self) -> Vec<&HierarchyNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(entry) = stack.pop() {
            out.push(entry);
            stack.extend(entry.children.iter().rev());
        }
        out
    }
}

/// The complete, normalized export of an interactive-narrative project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default)]
    pub global_variables: Vec<Namespace>,

    #[serde(default)]
    pub packages: Vec<Package>,

    #[serde(default)]
    pub object_definitions: Vec<TypeDef>,

    #[serde(default)]
    pub hierarchy: HierarchyNode,
}

impl ProjectDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from its normalized JSON shape.
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a document from an already parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DocumentError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.global_variables.push(namespace);
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_type_definition(mut self, definition: TypeDef) -> Self {
        self.object_definitions.push(definition);
        self
    }

    pub fn with_hierarchy(mut self, hierarchy: HierarchyNode) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Every node in package order, then node order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.packages.iter().flat_map(|package| package.nodes.iter())
    }

    /// Total number of nodes across all packages.
    pub fn node_count(&self) -> usize {
        self.packages.iter().map(|package| package.nodes.len()).sum()
    }
}
