//! Error types for the interpreter.
//!
//! Only inconsistent documents produce errors. Caller misuse (an out of
//! range choice, going back with no history) is not an error: those calls
//! leave the session untouched and hand back the current display state.

use thiserror::Error;

/// A line of node text that does not follow the `Path<op>Value` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("No operator in expression line: {0:?}")]
    MissingOperator(String),
    #[error("Empty variable path in expression line: {0:?}")]
    EmptyPath(String),
}

/// The document is internally inconsistent.
///
/// Traversal halts at the last good state when one of these is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("Node id '{0}' is used more than once")]
    DuplicateNodeId(String),

    #[error("Node '{from}' links to '{target}', which does not exist")]
    DanglingEdge { from: String, target: String },

    #[error("Node '{node}' needs {expected} outgoing edge(s) but has {found}")]
    EdgeCount {
        node: String,
        expected: usize,
        found: usize,
    },

    #[error("Condition '{node}' has no edge for the {} branch", branch_name(.branch))]
    MissingConditionBranch { node: String, branch: bool },

    #[error("Jump '{0}' has neither a target nor a single outgoing edge")]
    MissingJumpTarget(String),

    #[error("No node carries the start marker '{marker}'")]
    NoStartNode { marker: String },

    #[error("Start marker '{marker}' found on several nodes: {}", join_ids(.ids))]
    MultipleStartNodes { marker: String, ids: Vec<String> },

    #[error("Gave up at '{node}' after {budget} automatic steps; the flow probably loops")]
    StepBudgetExceeded { node: String, budget: usize },

    #[error("Node '{node}' has unsupported type '{node_type}'")]
    UnknownNodeType { node: String, node_type: String },

    #[error("Malformed expression on node '{node}': {source}")]
    Expression {
        node: String,
        #[source]
        source: ExpressionError,
    },
}

fn branch_name(branch: &bool) -> &'static str {
    if *branch {
        "true"
    } else {
        "false"
    }
}

fn join_ids(ids: &[String]) -> String {
    ids.join(", ")
}

/// Engine configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid engine configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("max_auto_steps must be at least 1")]
    ZeroStepBudget,
    #[error("start_marker must not be empty")]
    EmptyStartMarker,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_node() {
        let err = AuthoringError::DanglingEdge {
            from: "a".into(),
            target: "ghost".into(),
        };
        assert_eq!(
            err.to_string(),
            "Node 'a' links to 'ghost', which does not exist"
        );

        let err = AuthoringError::MissingConditionBranch {
            node: "c".into(),
            branch: false,
        };
        assert!(err.to_string().contains("false branch"));
    }

    #[test]
    fn test_expression_error_is_the_source() {
        use std::error::Error as _;

        let err = AuthoringError::Expression {
            node: "i".into(),
            source: ExpressionError::MissingOperator("Flags.Seen".into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Flags.Seen"));
    }
}
