//! Choice enumeration.

use story_model::{Node, NodeKind, VariableStore};

use super::display::{option_text, ChoiceOption};
use crate::error::AuthoringError;
use crate::expression::{evaluate_guard, first_meaningful_line};
use crate::graph::StoryGraph;

/// Options for every outgoing edge of `node`, in canonical edge order.
///
/// An option is enabled when its target's input guard is empty or holds.
/// Condition nodes instead annotate their two branches with the condition
/// line and its negation; only the branch the condition selects is enabled.
pub fn enumerate_choices<'doc>(
    graph: &StoryGraph<'doc>,
    node: &'doc Node,
    variables: &VariableStore,
) -> Result<Vec<ChoiceOption<'doc>>, AuthoringError> {
    if graph.kind_of(node) == NodeKind::Condition {
        return condition_choices(graph, node, variables);
    }

    let mut options = Vec::new();
    for (index, edge) in graph.edges(node).into_iter().enumerate() {
        let target = graph.resolve_edge(node, edge)?;
        let guard_text = target.guard_text().to_string();
        let enabled = guard_text.is_empty()
            || evaluate_guard(&guard_text, variables).map_err(|source| {
                AuthoringError::Expression {
                    node: target.id.clone(),
                    source,
                }
            })?;
        options.push(ChoiceOption {
            index,
            text: option_text(Some(edge), target, &graph.kind_of(target)),
            enabled,
            guard_text,
            target,
        });
    }
    Ok(options)
}

fn condition_choices<'doc>(
    graph: &StoryGraph<'doc>,
    node: &'doc Node,
    variables: &VariableStore,
) -> Result<Vec<ChoiceOption<'doc>>, AuthoringError> {
    let line = first_meaningful_line(&node.expression).unwrap_or("");
    let holds = evaluate_guard(line, variables).map_err(|source| AuthoringError::Expression {
        node: node.id.clone(),
        source,
    })?;
    let line = line.trim_end_matches(';').trim_end();

    let mut options = Vec::new();
    for (pin_index, pin) in node.output_pins.iter().take(2).enumerate() {
        let (guard_text, enabled) = if pin_index == 0 {
            (line.to_string(), holds)
        } else {
            (format!("!({})", line), !holds)
        };
        for edge in &pin.connections {
            let target = graph.resolve_edge(node, edge)?;
            options.push(ChoiceOption {
                index: options.len(),
                text: option_text(Some(edge), target, &graph.kind_of(target)),
                enabled,
                guard_text: guard_text.clone(),
                target,
            });
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_model::{Namespace, Package, Pin, ProjectDocument};

    fn store() -> VariableStore {
        VariableStore::from_namespaces(&[Namespace::new("Flags").with_variable("Seen", true)])
    }

    #[test]
    fn test_guards_enable_and_disable() {
        let doc = ProjectDocument::new().with_package(
            Package::new("Main")
                .with_node(Node::new("hub", "Hub").with_edge("c").with_edge("d"))
                .with_node(Node::new("c", "DialogueFragment").with_text("See C"))
                .with_node(
                    Node::new("d", "DialogueFragment")
                        .with_text("See D")
                        .with_guard("Flags.Seen==false;"),
                ),
        );
        let graph = StoryGraph::new(&doc).unwrap();
        let options = enumerate_choices(&graph, graph.node("hub").unwrap(), &store()).unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].text, "See C");
        assert!(options[0].enabled);
        assert_eq!(options[0].guard_text, "");
        assert_eq!(options[1].text, "See D");
        assert!(!options[1].enabled);
        assert_eq!(options[1].guard_text, "Flags.Seen==false");
        assert_eq!(options[1].index, 1);
    }

    #[test]
    fn test_malformed_guard_names_target() {
        let doc = ProjectDocument::new().with_package(
            Package::new("Main")
                .with_node(Node::new("hub", "Hub").with_edge("bad"))
                .with_node(Node::new("bad", "DialogueFragment").with_guard("Flags.Seen")),
        );
        let graph = StoryGraph::new(&doc).unwrap();
        let err = enumerate_choices(&graph, graph.node("hub").unwrap(), &store()).unwrap_err();
        assert!(matches!(err, AuthoringError::Expression { node, .. } if node == "bad"));
    }

    #[test]
    fn test_condition_annotations() {
        let doc = ProjectDocument::new().with_package(
            Package::new("Main")
                .with_node(
                    Node::new("cond", "Condition")
                        .with_expression("// check\nFlags.Seen==true;")
                        .with_output_pin(Pin::new().with_connection(story_model::Edge::new("yes")))
                        .with_output_pin(Pin::new().with_connection(story_model::Edge::new("no"))),
                )
                .with_node(Node::new("yes", "DialogueFragment").with_text("Yes"))
                .with_node(Node::new("no", "DialogueFragment").with_text("No")),
        );
        let graph = StoryGraph::new(&doc).unwrap();
        let options = enumerate_choices(&graph, graph.node("cond").unwrap(), &store()).unwrap();

        assert_eq!(options[0].guard_text, "Flags.Seen==true");
        assert!(options[0].enabled);
        assert_eq!(options[1].guard_text, "!(Flags.Seen==true)");
        assert!(!options[1].enabled);
        assert_eq!(options[1].index, 1);
    }
}
