//! Node, pin and edge definitions.

use serde::{Deserialize, Serialize};

/// A directed link from an output pin to another node's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Create an edge pointing at `target_id`.
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            label: None,
        }
    }

    /// Set the edge label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// An attachment point on a node.
///
/// On input pins `text` is the guard gating incoming traversal; on output
/// pins it is whatever the authoring tool exported and is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub connections: Vec<Edge>,
}

impl Pin {
    /// Create an empty pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pin text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a connection to another node.
    pub fn with_connection(mut self, edge: Edge) -> Self {
        self.connections.push(edge);
        self
    }
}

/// One unit of the narrative graph.
///
/// Nodes are created once by the document loader and never change while a
/// session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    /// Open type tag, e.g. `"Hub"` or `"DialogueFragment"`.
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub text: String,

    /// Assignment or condition source, newline delimited.
    #[serde(default)]
    pub expression: String,

    /// Speaker, already resolved to a literal name by the loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Jump destination id. Only meaningful for jump nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_directions: Option<String>,

    #[serde(default)]
    pub input_pins: Vec<Pin>,

    #[serde(default)]
    pub output_pins: Vec<Pin>,
}

impl Node {
    /// Create a node with the given id and type tag and no content.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            display_name: String::new(),
            text: String::new(),
            expression: String::new(),
            speaker_ref: None,
            color: None,
            parent_id: None,
            target: None,
            stage_directions: None,
            input_pins: Vec::new(),
            output_pins: Vec::new(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the expression source.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker_ref = Some(speaker.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_stage_directions(mut self, directions: impl Into<String>) -> Self {
        self.stage_directions = Some(directions.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the jump target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the guard on the first input pin, creating the pin if needed.
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        match self.input_pins.first_mut() {
            Some(pin) => pin.text = Some(guard.into()),
            None => self.input_pins.push(Pin::new().with_text(guard)),
        }
        self
    }

    /// Connect the first output pin to `target_id`, creating the pin if needed.
    pub fn with_edge(mut self, target_id: impl Into<String>) -> Self {
        if self.output_pins.is_empty() {
            self.output_pins.push(Pin::new());
        }
        self.output_pins[0].connections.push(Edge::new(target_id));
        self
    }

    /// Append a whole output pin.
    pub fn with_output_pin(mut self, pin: Pin) -> Self {
        self.output_pins.push(pin);
        self
    }

    /// All outgoing edges, pin order then connection order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.output_pins.iter().flat_map(|pin| pin.connections.iter())
    }

    /// Number of outgoing edges across every output pin.
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Guard text of the first input pin with trailing `;` removed.
    ///
    /// Returns an empty string when there is no guard.
    pub fn guard_text(&self) -> &str {
        self.input_pins
            .first()
            .and_then(|pin| pin.text.as_deref())
            .map(|text| text.trim().trim_end_matches(';').trim_end())
            .unwrap_or("")
    }

    /// Whether `token` appears in the text or the expression.
    pub fn mentions(&self, token: &str) -> bool {
        self.text.contains(token) || self.expression.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_follow_pin_then_connection_order() {
        let node = Node::new("a", "Hub")
            .with_output_pin(
                Pin::new()
                    .with_connection(Edge::new("b"))
                    .with_connection(Edge::new("c")),
            )
            .with_output_pin(Pin::new().with_connection(Edge::new("d")));

        let targets: Vec<_> = node.edges().map(|e| e.target_id.as_str()).collect();
        assert_eq!(targets, vec!["b", "c", "d"]);
        assert_eq!(node.edge_count(), 3);
    }

    #[test]
    fn test_guard_text_trims_semicolon() {
        let node = Node::new("a", "DialogueFragment").with_guard("Flags.Seen==false;\n");
        assert_eq!(node.guard_text(), "Flags.Seen==false");

        let unguarded = Node::new("b", "DialogueFragment");
        assert_eq!(unguarded.guard_text(), "");
    }

    #[test]
    fn test_with_edge_reuses_first_pin() {
        let node = Node::new("a", "DialogueFragment").with_edge("b").with_edge("c");
        assert_eq!(node.output_pins.len(), 1);
        assert_eq!(node.edge_count(), 2);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let node: Node = serde_json::from_str(
            r#"{
                "id": "n1",
                "type": "DialogueFragment",
                "displayName": "Greeting",
                "speakerRef": "Guard",
                "inputPins": [{ "text": "Flags.Open==true" }],
                "outputPins": [{ "connections": [{ "targetId": "n2", "label": "Go" }] }]
            }"#,
        )
        .unwrap();

        assert_eq!(node.node_type, "DialogueFragment");
        assert_eq!(node.display_name, "Greeting");
        assert_eq!(node.speaker_ref.as_deref(), Some("Guard"));
        assert_eq!(node.guard_text(), "Flags.Open==true");
        assert_eq!(node.edges().next().unwrap().label.as_deref(), Some("Go"));
        assert!(node.text.is_empty());
    }
}
