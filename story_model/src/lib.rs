//! # Story Model
//!
//! The data side of the narrative graph interpreter. This crate holds the
//! normalized project document handed over by a document loader, the closed
//! set of node kinds the interpreter understands, and the namespaced variable
//! store that gates which branches are reachable.
//!
//! Nothing in here walks the graph; see `story_engine` for traversal.

pub mod document;
pub mod kinds;
pub mod variables;

pub use document::*;
pub use kinds::*;
pub use variables::*;
