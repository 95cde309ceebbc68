//! # Graph Driver
//!
//! Owns the run loop: evaluate the current node's stage, merge its
//! update into the state, emit events, follow the transition table.
//! A run-level ceiling on total transitions guarantees termination
//! even if a defective stage stops advancing the cursor.

use serde_json::json;
use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::llm::GenerationBackend;
use crate::stages::{ArchitectStage, CoderStage, PlannerStage};
use crate::state::RunState;
use crate::tools::Workspace;

use super::events::{EventSender, RunEvent, RunEventKind};
use super::GraphNode;

/// Default bound on total stage transitions per run.
pub const DEFAULT_STEP_CEILING: usize = 100;

/// A halted run, carrying the accumulated state for diagnostics and
/// external resumption.
#[derive(Debug, thiserror::Error)]
#[error("run failed at {last_node}: {source}")]
pub struct RunError {
    /// The error that halted the run.
    #[source]
    pub source: OrchestratorError,
    /// Everything accumulated before the halt.
    pub state: Box<RunState>,
    /// The node whose stage raised the error.
    pub last_node: GraphNode,
}

/// The orchestration driver: stages, ceiling, and event sink.
pub struct Orchestrator {
    planner: PlannerStage,
    architect: ArchitectStage,
    coder: CoderStage,
    step_ceiling: usize,
    events: Option<EventSender>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>, workspace: Arc<Workspace>) -> Self {
        Self {
            planner: PlannerStage::new(backend.clone()),
            architect: ArchitectStage::new(backend.clone()),
            coder: CoderStage::new(backend, workspace),
            step_ceiling: DEFAULT_STEP_CEILING,
            events: None,
        }
    }

    /// Bound the total number of stage transitions for this run.
    pub fn with_step_ceiling(mut self, ceiling: usize) -> Self {
        self.step_ceiling = ceiling;
        self
    }

    /// Override the agent loop's per-step reasoning budget.
    pub fn with_agent_budget(mut self, max_steps: usize) -> Self {
        self.coder = self.coder.with_agent_budget(max_steps);
        self
    }

    /// Stream run events to an observer. Delivery is best-effort; a
    /// dropped receiver never affects the run.
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Drive one request through the graph to the terminal node.
    ///
    /// On any fatal error the returned [`RunError`] carries the full
    /// accumulated state, so callers can report the last completed
    /// stage or resume externally.
    pub async fn run(&self, user_prompt: impl Into<String>) -> Result<RunState, RunError> {
        let mut state = RunState::new(user_prompt);
        let mut node = GraphNode::Planner;
        let mut transitions = 0usize;

        self.emit(RunEvent::new(RunEventKind::RunStarted, node));
        tracing::info!(ceiling = self.step_ceiling, "run started");

        while !node.is_terminal() {
            if transitions >= self.step_ceiling {
                let source = OrchestratorError::CeilingExceeded {
                    ceiling: self.step_ceiling,
                };
                return Err(self.fail(source, state, node));
            }

            self.emit(RunEvent::new(RunEventKind::StageStarted, node));

            let result = match node {
                GraphNode::Planner => self.planner.run(&state).await,
                GraphNode::Architect => self.architect.run(&state).await,
                GraphNode::Coder => self.coder.run(&state).await,
                GraphNode::Done => break,
            };

            let update = match result {
                Ok(update) => update,
                Err(source) => return Err(self.fail(source, state, node)),
            };

            // Terminal coder invocations set the status slot and do
            // not move the cursor; only advancing ones get an event.
            if node == GraphNode::Coder && update.status.is_none() {
                if let Some(coder) = &update.coder {
                    self.emit(
                        RunEvent::new(RunEventKind::StepAdvanced, node)
                            .with_data(json!({ "cursor": coder.current_step_idx })),
                    );
                }
            }

            state.apply(update);
            transitions += 1;
            self.emit(RunEvent::new(RunEventKind::StageCompleted, node));

            node = node.next(&state);
        }

        self.emit(
            RunEvent::new(RunEventKind::RunCompleted, node)
                .with_data(json!({ "transitions": transitions })),
        );
        tracing::info!(transitions, "run completed");
        Ok(state)
    }

    fn fail(&self, source: OrchestratorError, state: RunState, node: GraphNode) -> RunError {
        self.emit(
            RunEvent::new(RunEventKind::RunFailed, node)
                .with_data(json!({ "error": source.kind() })),
        );
        tracing::error!(node = %node, error = %source, "run failed");
        RunError {
            source,
            state: Box::new(state),
            last_node: node,
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}
