//! Namespaced variable state.
//!
//! Variables live in a tree of scopes: the first path segment is the
//! namespace, the last is the variable, and anything in between is a nested
//! scope. Sparse trees of the same shape are used to describe assignments,
//! so applying an instruction is a deep merge of one tree into another.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::document::Namespace;

/// A scalar variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Turn the strings `"true"` and `"false"` into booleans; everything
    /// else is returned unchanged.
    pub fn normalized(&self) -> Value {
        match self {
            Value::String(s) if s == "true" => Value::Bool(true),
            Value::String(s) if s == "false" => Value::Bool(false),
            other => other.clone(),
        }
    }

    /// Equality after normalizing both sides.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.normalized() == other.normalized()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.normalized() {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            // Integral numbers print without a fractional part.
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// Either a leaf value or a nested scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableEntry {
    Value(Value),
    Scope(VariableTree),
}

/// A tree of scopes ending in values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTree {
    entries: BTreeMap<String, VariableEntry>,
}

impl VariableTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by path.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, scopes) = path.split_last()?;
        let mut tree = self;
        for segment in scopes {
            match tree.entries.get(*segment)? {
                VariableEntry::Scope(inner) => tree = inner,
                VariableEntry::Value(_) => return None,
            }
        }
        match tree.entries.get(*last)? {
            VariableEntry::Value(value) => Some(value),
            VariableEntry::Scope(_) => None,
        }
    }

    /// Look up a direct child scope.
    pub fn scope(&self, name: &str) -> Option<&VariableTree> {
        match self.entries.get(name)? {
            VariableEntry::Scope(tree) => Some(tree),
            VariableEntry::Value(_) => None,
        }
    }

    /// Set a value at `path`, creating scopes along the way.
    ///
    /// A value sitting where a scope is needed is replaced by the scope.
    /// An empty path is ignored.
    pub fn set<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        let Some((last, scopes)) = path.split_last() else {
            return;
        };
        let mut tree = self;
        for segment in scopes {
            let entry = tree
                .entries
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| VariableEntry::Scope(VariableTree::new()));
            if let VariableEntry::Value(_) = entry {
                *entry = VariableEntry::Scope(VariableTree::new());
            }
            let VariableEntry::Scope(inner) = entry else {
                return;
            };
            tree = inner;
        }
        tree.entries
            .insert(last.as_ref().to_string(), VariableEntry::Value(value));
    }

    /// Deep-merge `other` into this tree.
    ///
    /// Only the leaves present in `other` are overwritten; everything else
    /// is left as it was.
    pub fn merge(&mut self, other: &VariableTree) {
        for (name, incoming) in &other.entries {
            match incoming {
                VariableEntry::Value(value) => {
                    self.entries
                        .insert(name.clone(), VariableEntry::Value(value.clone()));
                }
                VariableEntry::Scope(inner) => match self.entries.get_mut(name) {
                    Some(VariableEntry::Scope(existing)) => existing.merge(inner),
                    _ => {
                        self.entries
                            .insert(name.clone(), VariableEntry::Scope(inner.clone()));
                    }
                },
            }
        }
    }

    /// Names of the direct children, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every leaf as a dotted path and its value, in sorted order.
    pub fn leaves(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match entry {
                VariableEntry::Value(value) => out.push((path, value)),
                VariableEntry::Scope(inner) => inner.collect_leaves(&path, out),
            }
        }
    }
}

/// A point-in-time copy of the store contents.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSnapshot(VariableTree);

impl VariableSnapshot {
    /// The captured values.
    pub fn tree(&self) -> &VariableTree {
        &self.0
    }
}

/// Namespaced variable state seeded from a document's global variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableStore {
    current: VariableTree,
    initial: VariableTree,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from namespace declarations.
    pub fn from_namespaces(namespaces: &[Namespace]) -> Self {
        let mut initial = VariableTree::new();
        for namespace in namespaces {
            for variable in &namespace.variables {
                initial.set(
                    &[namespace.name.as_str(), variable.name.as_str()],
                    variable.initial_value.clone(),
                );
            }
        }
        Self {
            current: initial.clone(),
            initial,
        }
    }

    /// Current value of `namespace.name`.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Value> {
        self.current.get(&[namespace, name])
    }

    /// Current value at an arbitrarily nested path.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        self.current.get(path)
    }

    /// Deep-merge a sparse assignment tree into the store.
    pub fn merge_assign(&mut self, partial: &VariableTree) {
        self.current.merge(partial);
    }

    pub fn snapshot(&self) -> VariableSnapshot {
        VariableSnapshot(self.current.clone())
    }

    /// Roll the store back to a snapshot.
    pub fn restore(&mut self, snapshot: &VariableSnapshot) {
        self.current = snapshot.0.clone();
    }

    /// Put every variable back to its declared initial value.
    pub fn reset_to_initial(&mut self) {
        self.current = self.initial.clone();
    }

    /// Snapshot of the declared initial values.
    pub fn initial_snapshot(&self) -> VariableSnapshot {
        VariableSnapshot(self.initial.clone())
    }

    /// Namespace names in sorted order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.current.names()
    }

    /// Every variable as a dotted path and its current value.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> {
        self.current.leaves().into_iter()
    }

    pub fn tree(&self) -> &VariableTree {
        &self.current
    }
}
