//! # Orchestration Graph
//!
//! The state machine wiring the stages together: planner → architect
//! → coder, with the coder looping on itself until the status slot
//! reports completion. Transitions live in a pure table; the driver
//! loop in [`driver`] evaluates it and enforces the run-level
//! transition ceiling.

pub mod driver;
pub mod events;

pub use driver::{Orchestrator, RunError, DEFAULT_STEP_CEILING};
pub use events::{EventSender, RunEvent, RunEventKind};

use serde::Serialize;

use crate::state::RunState;

/// Nodes of the orchestration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNode {
    /// Entry point
    Planner,
    Architect,
    Coder,
    /// Terminal state
    Done,
}

impl GraphNode {
    /// The successor node, given the state after this node's stage
    /// ran. The only conditional edge is the coder self-loop.
    pub fn next(self, state: &RunState) -> GraphNode {
        match self {
            GraphNode::Planner => GraphNode::Architect,
            GraphNode::Architect => GraphNode::Coder,
            GraphNode::Coder => {
                if state.is_done() {
                    GraphNode::Done
                } else {
                    GraphNode::Coder
                }
            }
            GraphNode::Done => GraphNode::Done,
        }
    }

    /// Whether this node ends the run.
    pub fn is_terminal(self) -> bool {
        self == GraphNode::Done
    }
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GraphNode::Planner => "planner",
            GraphNode::Architect => "architect",
            GraphNode::Coder => "coder",
            GraphNode::Done => "done",
        };
        f.write_str(name)
    }
}
