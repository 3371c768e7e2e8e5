//! What presentation code is handed after every trigger.

use story_model::{Edge, Node, NodeKind};

/// A node's on-screen content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentView<'doc> {
    pub node: &'doc Node,
    pub title: String,
    pub body: String,
    pub speaker: Option<String>,
    pub stage_directions: Option<String>,
    pub color: Option<String>,
    /// Whether continue leads anywhere.
    pub has_next: bool,
}

/// One selectable (or greyed out) option.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption<'doc> {
    pub index: usize,
    pub text: String,
    pub enabled: bool,
    /// Guard shown next to the option; empty when unguarded.
    pub guard_text: String,
    pub target: &'doc Node,
}

/// A node offering its outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicesView<'doc> {
    pub offering_node: &'doc Node,
    /// The offering node's own content, shown alongside the options.
    pub title: String,
    pub body: String,
    pub options: Vec<ChoiceOption<'doc>>,
}

impl<'doc> ChoicesView<'doc> {
    /// Indices of the options that can be selected.
    pub fn enabled_indices(&self) -> Vec<usize> {
        self.options
            .iter()
            .filter(|option| option.enabled)
            .map(|option| option.index)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState<'doc> {
    Content(ContentView<'doc>),
    Choices(ChoicesView<'doc>),
    EndOfFlow,
}

impl<'doc> DisplayState<'doc> {
    /// The node behind this state, if any.
    pub fn node(&self) -> Option<&'doc Node> {
        match self {
            DisplayState::Content(view) => Some(view.node),
            DisplayState::Choices(view) => Some(view.offering_node),
            DisplayState::EndOfFlow => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, DisplayState::EndOfFlow)
    }
}

/// Title and body for a node.
///
/// Hubs show only their display name. Everything else uses the first
/// non-empty of text, expression and display name as the body.
pub fn node_text(node: &Node, kind: &NodeKind) -> (String, String) {
    if *kind == NodeKind::Hub {
        return (node.display_name.clone(), String::new());
    }
    let body = [&node.text, &node.expression, &node.display_name]
        .into_iter()
        .find(|candidate| !candidate.trim().is_empty())
        .cloned()
        .unwrap_or_default();
    (node.display_name.clone(), body)
}

/// Text for an option leading to `target` over `edge`.
///
/// An edge label wins; otherwise the target's body, or its title when the
/// target is a hub.
pub fn option_text(edge: Option<&Edge>, target: &Node, kind: &NodeKind) -> String {
    if let Some(label) = edge
        .and_then(|edge| edge.label.as_deref())
        .filter(|label| !label.trim().is_empty())
    {
        return label.to_string();
    }
    let (title, body) = node_text(target, kind);
    if body.is_empty() {
        title
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_precedence() {
        let kind = NodeKind::DialogueFragment;
        let node = Node::new("a", "DialogueFragment")
            .with_display_name("Name")
            .with_expression("NS.A=1;")
            .with_text("Spoken");
        assert_eq!(node_text(&node, &kind), ("Name".into(), "Spoken".into()));

        let node = Node::new("a", "Instruction")
            .with_display_name("Name")
            .with_expression("NS.A=1;");
        assert_eq!(node_text(&node, &kind).1, "NS.A=1;");

        let node = Node::new("a", "DialogueFragment").with_display_name("Name");
        assert_eq!(node_text(&node, &kind).1, "Name");
    }

    #[test]
    fn test_hub_shows_display_name_only() {
        let node = Node::new("h", "Hub")
            .with_display_name("Crossroads")
            .with_text("ignored");
        assert_eq!(
            node_text(&node, &NodeKind::Hub),
            ("Crossroads".into(), String::new())
        );
        assert_eq!(option_text(None, &node, &NodeKind::Hub), "Crossroads");
    }

    #[test]
    fn test_edge_label_wins() {
        let node = Node::new("a", "DialogueFragment").with_text("Body");
        let labelled = Edge::new("a").with_label("Ask about the map");
        let blank = Edge::new("a").with_label("  ");
        let kind = NodeKind::DialogueFragment;

        assert_eq!(option_text(Some(&labelled), &node, &kind), "Ask about the map");
        assert_eq!(option_text(Some(&blank), &node, &kind), "Body");
    }
}
