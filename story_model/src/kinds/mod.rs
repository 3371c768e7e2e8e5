//! Node kinds: the closed set of behaviours the interpreter knows about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a node behaves during traversal.
///
/// The document carries an open type string; anything that cannot be mapped
/// onto one of the known behaviours ends up as [`NodeKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Applies its expression to the variable store on entry.
    Instruction,
    /// A line of dialogue; displayed and advanced on continue.
    DialogueFragment,
    /// Explicit branch point; always offers its edges as choices.
    Hub,
    /// Never displayed; redirects to another node.
    Jump,
    /// Container; descends into its first child and returns via the parent stack.
    FlowFragment,
    /// Never displayed; branches on a guard.
    Condition,
    /// A type tag with no known behaviour.
    Unknown(String),
}

impl NodeKind {
    /// Map a well-known type name onto its kind.
    ///
    /// Returns `None` for custom template types; callers resolve those
    /// through the document's type definitions.
    pub fn from_type_name(name: &str) -> Option<NodeKind> {
        match name {
            "Instruction" => Some(NodeKind::Instruction),
            "DialogueFragment" | "DialogueInteractiveFragment" => Some(NodeKind::DialogueFragment),
            "Hub" => Some(NodeKind::Hub),
            "Jump" => Some(NodeKind::Jump),
            "FlowFragment" | "Dialogue" => Some(NodeKind::FlowFragment),
            "Condition" => Some(NodeKind::Condition),
            _ => None,
        }
    }

    /// Kinds resolved immediately on entry without ever being shown.
    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            NodeKind::Jump | NodeKind::FlowFragment | NodeKind::Condition
        )
    }

    /// Kinds that can be the current displayed node.
    pub fn is_displayed(&self) -> bool {
        matches!(self, NodeKind::Instruction | NodeKind::DialogueFragment)
    }

    /// Name used in logs and diagnostics.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Instruction => "Instruction",
            NodeKind::DialogueFragment => "DialogueFragment",
            NodeKind::Hub => "Hub",
            NodeKind::Jump => "Jump",
            NodeKind::FlowFragment => "FlowFragment",
            NodeKind::Condition => "Condition",
            NodeKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_type_names() {
        assert_eq!(NodeKind::from_type_name("Hub"), Some(NodeKind::Hub));
        assert_eq!(
            NodeKind::from_type_name("DialogueInteractiveFragment"),
            Some(NodeKind::DialogueFragment)
        );
        assert_eq!(
            NodeKind::from_type_name("Dialogue"),
            Some(NodeKind::FlowFragment)
        );
        assert_eq!(NodeKind::from_type_name("Choice_Template"), None);
    }

    #[test]
    fn test_auto_and_displayed_are_disjoint() {
        let all = [
            NodeKind::Instruction,
            NodeKind::DialogueFragment,
            NodeKind::Hub,
            NodeKind::Jump,
            NodeKind::FlowFragment,
            NodeKind::Condition,
            NodeKind::Unknown("Comment".into()),
        ];
        for kind in &all {
            assert!(!(kind.is_auto() && kind.is_displayed()), "{kind}");
        }
        assert!(!NodeKind::Hub.is_auto());
        assert!(!NodeKind::Hub.is_displayed());
    }

    #[test]
    fn test_unknown_display() {
        assert_eq!(NodeKind::Unknown("Comment".into()).to_string(), "Comment");
        assert_eq!(NodeKind::Condition.to_string(), "Condition");
    }
}
