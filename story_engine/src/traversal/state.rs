//! Navigation state owned by a session.

use story_model::{Node, VariableSnapshot};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position<'doc> {
    /// A node is on screen waiting for continue.
    Displaying(&'doc Node),
    /// A node's outgoing edges are on offer.
    Offering(&'doc Node),
    /// Nothing further to show.
    EndOfFlow,
}

impl<'doc> Position<'doc> {
    pub fn node(&self) -> Option<&'doc Node> {
        match *self {
            Position::Displaying(node) | Position::Offering(node) => Some(node),
            Position::EndOfFlow => None,
        }
    }
}

/// A point the reader can go back to.
#[derive(Debug, Clone)]
pub struct PreviousChoice<'doc> {
    /// The node that was on screen or offering choices.
    pub offering_node: &'doc Node,

    /// What the reader picked, or the text of the node they continued past.
    pub display_text: String,

    /// Store contents after the offering node's own assignments ran.
    pub variables: VariableSnapshot,

    /// Length of the history when this point was recorded.
    pub history_depth: usize,

    pub parent_stack: Vec<&'doc Node>,

    pub was_multi_choice: bool,

    /// Node advanced past without being shown.
    pub skipped_node: Option<&'doc Node>,
}

/// Position, visited nodes, open containers and the undo stack.
#[derive(Debug, Clone)]
pub struct NavigationState<'doc> {
    pub position: Position<'doc>,
    pub history: Vec<&'doc Node>,
    /// Flow fragments currently descended into, innermost last.
    pub parent_stack: Vec<&'doc Node>,
    pub previous_choices: Vec<PreviousChoice<'doc>>,
}

impl<'doc> Default for NavigationState<'doc> {
    fn default() -> Self {
        Self {
            position: Position::EndOfFlow,
            history: Vec::new(),
            parent_stack: Vec::new(),
            previous_choices: Vec::new(),
        }
    }
}

impl<'doc> NavigationState<'doc> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as on restart.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether `node` is the innermost open container.
    pub fn is_open_container(&self, node: &Node) -> bool {
        self.parent_stack
            .last()
            .is_some_and(|top| top.id == node.id)
    }

    pub fn current_node(&self) -> Option<&'doc Node> {
        self.position.node()
    }
}
