//! Traversal engine: the state machine that walks the graph.
//!
//! A session reacts to five triggers (continue, select, back, jump,
//! restart). Each trigger runs to completion before returning:
//!
//! 1. **Trigger**: the caller asks to move
//! 2. **Step**: the current node's exit rule picks the next node
//! 3. **Settle**: jumps, containers and conditions resolve in a bounded loop
//! 4. **Render**: the resting position becomes a [`DisplayState`]
//!
//! If any step reports an [`AuthoringError`] the session is rolled back to
//! exactly what it was before the trigger.

mod choices;
mod display;
mod state;

pub use choices::*;
pub use display::*;
pub use state::*;

use story_model::{Node, NodeKind, ProjectDocument, VariableStore};

use crate::config::EngineConfig;
use crate::error::AuthoringError;
use crate::expression::{assignments_from_expression, evaluate_guard, first_meaningful_line};
use crate::graph::StoryGraph;

/// Where following a node's own edges leads.
enum Exit<'doc> {
    Next(&'doc Node),
    Rest(Position<'doc>),
}

/// One reader walking one document.
///
/// The session owns its variable store; the document is borrowed and may
/// back any number of sessions at once.
#[derive(Debug)]
pub struct StorySession<'doc> {
    graph: StoryGraph<'doc>,
    config: EngineConfig,
    variables: VariableStore,
    nav: NavigationState<'doc>,
    start: &'doc Node,
    display: DisplayState<'doc>,
}

impl<'doc> StorySession<'doc> {
    /// Start a session with the default configuration.
    pub fn start(document: &'doc ProjectDocument) -> Result<Self, AuthoringError> {
        Self::start_with_config(document, EngineConfig::default())
    }

    /// Index the document, find the start node and enter it.
    #[tracing::instrument(skip_all, fields(nodes = document.node_count(), marker = %config.start_marker))]
    pub fn start_with_config(
        document: &'doc ProjectDocument,
        config: EngineConfig,
    ) -> Result<Self, AuthoringError> {
        let graph = StoryGraph::new(document)?;
        let start = graph.find_start(&config.start_marker, config.strict_start)?;
        let variables = VariableStore::from_namespaces(&document.global_variables);

        let mut session = Self {
            graph,
            config,
            variables,
            nav: NavigationState::new(),
            start,
            display: DisplayState::EndOfFlow,
        };
        session.transition(|session| session.reenter(start))?;
        tracing::info!(start = %start.id, "Session started");
        Ok(session)
    }

    /// The state produced by the last successful trigger.
    pub fn current(&self) -> &DisplayState<'doc> {
        &self.display
    }

    /// Move on from the displayed node.
    ///
    /// Ignored unless a node is being displayed.
    #[tracing::instrument(skip_all)]
    pub fn continue_flow(&mut self) -> Result<DisplayState<'doc>, AuthoringError> {
        let Position::Displaying(node) = self.nav.position else {
            tracing::debug!("Continue ignored: no node is waiting for it");
            return Ok(self.display.clone());
        };
        self.transition(|session| session.advance_from(node))
    }

    /// Pick one of the offered options.
    ///
    /// Out of range or disabled options leave the session untouched.
    #[tracing::instrument(skip(self))]
    pub fn select_choice(&mut self, index: usize) -> Result<DisplayState<'doc>, AuthoringError> {
        let DisplayState::Choices(view) = &self.display else {
            tracing::debug!("Selection ignored: no choices on offer");
            return Ok(self.display.clone());
        };
        let Some(option) = view.options.get(index) else {
            tracing::debug!(options = view.options.len(), "Selection ignored: index out of range");
            return Ok(self.display.clone());
        };
        if !option.enabled {
            tracing::debug!(guard = %option.guard_text, "Selection ignored: option is disabled");
            return Ok(self.display.clone());
        }

        let offering = view.offering_node;
        let target = option.target;
        let text = option.text.clone();
        self.transition(|session| session.choose(offering, target, text))
    }

    /// Undo back to the most recent choice point.
    #[tracing::instrument(skip_all)]
    pub fn go_back(&mut self) -> Result<DisplayState<'doc>, AuthoringError> {
        if self.nav.previous_choices.is_empty() {
            tracing::debug!("Back ignored: nothing to go back to");
            return Ok(self.display.clone());
        }
        self.transition(|session| {
            session.rewind();
            Ok(())
        })
    }

    /// Reset everything and enter `id` directly.
    ///
    /// An unknown id leaves the session untouched.
    #[tracing::instrument(skip(self))]
    pub fn jump_to_node(&mut self, id: &str) -> Result<DisplayState<'doc>, AuthoringError> {
        let Some(node) = self.graph.node(id) else {
            tracing::warn!("Jump ignored: no such node");
            return Ok(self.display.clone());
        };
        self.transition(|session| session.reenter(node))
    }

    /// Reset everything and enter the start node again.
    #[tracing::instrument(skip_all)]
    pub fn restart(&mut self) -> Result<DisplayState<'doc>, AuthoringError> {
        let start = self.start;
        self.transition(|session| session.reenter(start))
    }

    /// Options `node` would offer against the current variables.
    pub fn choices_for(&self, node: &'doc Node) -> Result<Vec<ChoiceOption<'doc>>, AuthoringError> {
        enumerate_choices(&self.graph, node, &self.variables)
    }

    pub fn graph(&self) -> &StoryGraph<'doc> {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn start_node(&self) -> &'doc Node {
        self.start
    }

    pub fn current_node(&self) -> Option<&'doc Node> {
        self.nav.current_node()
    }

    pub fn position(&self) -> Position<'doc> {
        self.nav.position
    }

    /// Nodes moved past, oldest first.
    pub fn history(&self) -> &[&'doc Node] {
        &self.nav.history
    }

    pub fn parent_stack(&self) -> &[&'doc Node] {
        &self.nav.parent_stack
    }

    pub fn previous_choices(&self) -> &[PreviousChoice<'doc>] {
        &self.nav.previous_choices
    }

    pub fn can_go_back(&self) -> bool {
        !self.nav.previous_choices.is_empty()
    }

    /// Run one trigger atomically.
    fn transition<F>(&mut self, step: F) -> Result<DisplayState<'doc>, AuthoringError>
    where
        F: FnOnce(&mut Self) -> Result<(), AuthoringError>,
    {
        let saved_nav = self.nav.clone();
        let saved_variables = self.variables.snapshot();

        match step(self).and_then(|()| self.render()) {
            Ok(display) => {
                self.display = display.clone();
                Ok(display)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Transition aborted; keeping the last good state");
                self.nav = saved_nav;
                self.variables.restore(&saved_variables);
                Err(err)
            }
        }
    }

    fn reenter(&mut self, node: &'doc Node) -> Result<(), AuthoringError> {
        self.variables.reset_to_initial();
        self.nav.clear();
        self.nav.parent_stack = self.enclosing_containers(node);
        self.enter(node)
    }

    /// Flow fragments that contain `node`, outermost first.
    ///
    /// Entering mid-container must leave it open so that a path returning to
    /// the container exits it instead of starting over.
    fn enclosing_containers(&self, node: &'doc Node) -> Vec<&'doc Node> {
        let mut containers = Vec::new();
        let mut current = node;
        // Bounded in case the hierarchy links loop.
        for _ in 0..self.graph.node_count() {
            let Some(parent) = self.graph.parent_of(&current.id) else {
                break;
            };
            if self.graph.kind_of(parent) == NodeKind::FlowFragment {
                containers.push(parent);
            }
            current = parent;
        }
        containers.reverse();
        containers
    }

    /// Exit rule for a displayed node on continue.
    fn advance_from(&mut self, node: &'doc Node) -> Result<(), AuthoringError> {
        let kind = self.graph.kind_of(node);
        let edges = self.graph.edges(node);

        if kind == NodeKind::Instruction && edges.len() != 1 {
            return Err(AuthoringError::EdgeCount {
                node: node.id.clone(),
                expected: 1,
                found: edges.len(),
            });
        }

        match edges.as_slice() {
            [] => {
                self.record_choice(node, self.summary(node, &kind), false, None);
                self.nav.history.push(node);
                self.nav.position = Position::EndOfFlow;
                Ok(())
            }
            [edge] => {
                let next = self.graph.resolve_edge(node, edge)?;
                self.record_choice(node, self.summary(node, &kind), false, None);
                self.nav.history.push(node);
                self.enter(next)
            }
            _ => {
                self.nav.position = Position::Offering(node);
                Ok(())
            }
        }
    }

    /// Exit rule for an offering node once an option is picked.
    fn choose(
        &mut self,
        offering: &'doc Node,
        target: &'doc Node,
        text: String,
    ) -> Result<(), AuthoringError> {
        let kind = self.graph.kind_of(target);

        // Single-output displayable nodes are passed through rather than shown.
        if kind.is_displayed() && target.edge_count() == 1 {
            let edges = self.graph.edges(target);
            let successor = self.graph.resolve_edge(target, edges[0])?;

            self.record_choice(offering, text, true, Some(target));
            self.nav.history.push(offering);
            if kind == NodeKind::Instruction {
                self.apply_assignments(target)?;
            }
            self.nav.history.push(target);
            tracing::debug!(skipped = %target.id, next = %successor.id, "Skipped past chosen node");
            return self.enter(successor);
        }

        self.record_choice(offering, text, true, None);
        self.nav.history.push(offering);
        self.enter(target)
    }

    fn rewind(&mut self) {
        let Some(entry) = self.nav.previous_choices.pop() else {
            return;
        };
        self.variables.restore(&entry.variables);
        self.nav.history.truncate(entry.history_depth);
        self.nav.parent_stack = entry.parent_stack;

        let node = entry.offering_node;
        self.nav.position = if self.is_hub_like(node) {
            Position::Offering(node)
        } else {
            Position::Displaying(node)
        };
        tracing::debug!(node = %node.id, "Went back");
    }

    /// Resolve automatic nodes until something can be shown.
    fn enter(&mut self, node: &'doc Node) -> Result<(), AuthoringError> {
        let mut current = node;
        let mut hops = 0;

        loop {
            let kind = self.graph.kind_of(current);
            tracing::debug!(node = %current.id, kind = %kind, "Entering node");

            let next = match kind {
                NodeKind::Instruction => {
                    self.apply_assignments(current)?;
                    Exit::Rest(Position::Displaying(current))
                }
                NodeKind::DialogueFragment => Exit::Rest(Position::Displaying(current)),
                NodeKind::Hub => Exit::Rest(Position::Offering(current)),
                NodeKind::Jump => Exit::Next(self.jump_target(current)?),
                NodeKind::Condition => Exit::Next(self.condition_branch(current)?),
                NodeKind::FlowFragment => {
                    if self.nav.is_open_container(current) {
                        // A contained path came back out; leave the container.
                        self.nav.parent_stack.pop();
                        self.follow_own_edges(current)?
                    } else if let Some(child) = self.graph.first_child(current) {
                        self.nav.parent_stack.push(current);
                        Exit::Next(child)
                    } else {
                        self.follow_own_edges(current)?
                    }
                }
                NodeKind::Unknown(node_type) => {
                    return Err(AuthoringError::UnknownNodeType {
                        node: current.id.clone(),
                        node_type,
                    })
                }
            };

            match next {
                Exit::Next(node) => {
                    hops += 1;
                    if hops > self.config.max_auto_steps {
                        return Err(AuthoringError::StepBudgetExceeded {
                            node: current.id.clone(),
                            budget: self.config.max_auto_steps,
                        });
                    }
                    current = node;
                }
                Exit::Rest(position) => {
                    self.nav.position = position;
                    return Ok(());
                }
            }
        }
    }

    fn follow_own_edges(&self, node: &'doc Node) -> Result<Exit<'doc>, AuthoringError> {
        let edges = self.graph.edges(node);
        Ok(match edges.as_slice() {
            [] => Exit::Rest(Position::EndOfFlow),
            [edge] => Exit::Next(self.graph.resolve_edge(node, edge)?),
            _ => Exit::Rest(Position::Offering(node)),
        })
    }

    fn jump_target(&self, node: &'doc Node) -> Result<&'doc Node, AuthoringError> {
        if let Some(target) = node.target.as_deref().filter(|t| !t.trim().is_empty()) {
            return self
                .graph
                .node(target)
                .ok_or_else(|| AuthoringError::DanglingEdge {
                    from: node.id.clone(),
                    target: target.to_string(),
                });
        }
        match self.graph.edges(node).as_slice() {
            [edge] => self.graph.resolve_edge(node, edge),
            _ => Err(AuthoringError::MissingJumpTarget(node.id.clone())),
        }
    }

    fn condition_branch(&self, node: &'doc Node) -> Result<&'doc Node, AuthoringError> {
        let line = first_meaningful_line(&node.expression).unwrap_or("");
        let holds = evaluate_guard(line, &self.variables).map_err(|source| {
            AuthoringError::Expression {
                node: node.id.clone(),
                source,
            }
        })?;
        let pin = if holds { 0 } else { 1 };

        let edge = node
            .output_pins
            .get(pin)
            .and_then(|pin| pin.connections.first())
            .ok_or_else(|| AuthoringError::MissingConditionBranch {
                node: node.id.clone(),
                branch: holds,
            })?;
        tracing::debug!(node = %node.id, condition = line, holds, "Condition evaluated");
        self.graph.resolve_edge(node, edge)
    }

    /// Parse the whole expression first so a bad line changes nothing.
    fn apply_assignments(&mut self, node: &Node) -> Result<(), AuthoringError> {
        let partial = assignments_from_expression(&node.expression).map_err(|source| {
            AuthoringError::Expression {
                node: node.id.clone(),
                source,
            }
        })?;
        if !partial.is_empty() {
            tracing::debug!(node = %node.id, assignments = ?partial.leaves(), "Applying assignments");
            self.variables.merge_assign(&partial);
        }
        Ok(())
    }

    fn record_choice(
        &mut self,
        offering: &'doc Node,
        display_text: String,
        was_multi_choice: bool,
        skipped_node: Option<&'doc Node>,
    ) {
        self.nav.previous_choices.push(PreviousChoice {
            offering_node: offering,
            display_text,
            variables: self.variables.snapshot(),
            history_depth: self.nav.history.len(),
            parent_stack: self.nav.parent_stack.clone(),
            was_multi_choice,
            skipped_node,
        });
    }

    fn is_hub_like(&self, node: &Node) -> bool {
        self.graph.kind_of(node) == NodeKind::Hub || node.edge_count() > 1
    }

    fn summary(&self, node: &Node, kind: &NodeKind) -> String {
        let (title, body) = node_text(node, kind);
        if body.is_empty() {
            title
        } else {
            body
        }
    }

    fn render(&self) -> Result<DisplayState<'doc>, AuthoringError> {
        Ok(match self.nav.position {
            Position::EndOfFlow => DisplayState::EndOfFlow,
            Position::Displaying(node) => {
                let kind = self.graph.kind_of(node);
                let (title, body) = node_text(node, &kind);
                let has_next = match kind {
                    NodeKind::Instruction => node.edge_count() == 1,
                    _ => node.edge_count() > 0,
                };
                DisplayState::Content(ContentView {
                    node,
                    title,
                    body,
                    speaker: node.speaker_ref.clone(),
                    stage_directions: node.stage_directions.clone(),
                    color: node.color.clone(),
                    has_next,
                })
            }
            Position::Offering(node) => {
                let (title, body) = node_text(node, &self.graph.kind_of(node));
                DisplayState::Choices(ChoicesView {
                    offering_node: node,
                    title,
                    body,
                    options: enumerate_choices(&self.graph, node, &self.variables)?,
                })
            }
        })
    }
}
