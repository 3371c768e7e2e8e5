//! # Story Engine
//!
//! Interprets an exported interactive-narrative project: a directed graph of
//! dialogue lines, hubs, conditions, jumps, containers and instructions. A
//! [`StorySession`] walks the graph one trigger at a time and tells the
//! presentation layer what to show next.
//!
//! ## Core Components
//!
//! - **expression**: the line-based assignment and guard language found in node text
//! - **graph**: indexed, read-only view of a [`story_model::ProjectDocument`]
//! - **traversal**: the session state machine, choice enumeration and undo
//!
//! ## Example
//!
//! ```
//! use story_engine::{DisplayState, StorySession};
//! use story_model::{Node, Package, ProjectDocument};
//!
//! let doc = ProjectDocument::new().with_package(
//!     Package::new("Main")
//!         .with_node(Node::new("a", "DialogueFragment").with_text("@start Hello").with_edge("b"))
//!         .with_node(Node::new("b", "DialogueFragment").with_text("Goodbye")),
//! );
//!
//! let mut session = StorySession::start(&doc).unwrap();
//! assert!(matches!(session.current(), DisplayState::Content(view) if view.node.id == "a"));
//!
//! session.continue_flow().unwrap();
//! assert!(session.continue_flow().unwrap().is_end());
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod graph;
pub mod traversal;

pub use config::*;
pub use error::*;
pub use expression::*;
pub use graph::*;
pub use traversal::*;

pub use story_model;
