//! # Coder Stage
//!
//! Advances a task plan by exactly one implementation step per
//! invocation. The actual edit is performed by the bounded agent loop;
//! this stage's own job is cursor discipline: initialize lazily,
//! detect completion without touching the filesystem, advance by one
//! on success, and never advance past a failed step.

use std::sync::Arc;

use crate::agent::AgentLoop;
use crate::error::OrchestratorError;
use crate::llm::GenerationBackend;
use crate::state::{CoderState, RunState, RunStatus, StateUpdate};
use crate::tools::Workspace;

use super::prompts;

/// Coding stage: agent loop plus workspace.
pub struct CoderStage {
    agent: AgentLoop,
    workspace: Arc<Workspace>,
}

impl CoderStage {
    pub fn new(backend: Arc<dyn GenerationBackend>, workspace: Arc<Workspace>) -> Self {
        Self {
            agent: AgentLoop::new(backend),
            workspace,
        }
    }

    /// Override the agent loop's per-step reasoning budget.
    pub fn with_agent_budget(mut self, max_steps: usize) -> Self {
        self.agent = self.agent.with_max_steps(max_steps);
        self
    }

    /// Execute one step, or mark the run done if none remain.
    pub async fn run(&self, state: &RunState) -> Result<StateUpdate, OrchestratorError> {
        let coder = match &state.coder {
            Some(coder) => coder.clone(),
            None => CoderState::new(
                state
                    .task_plan
                    .clone()
                    .ok_or(OrchestratorError::MissingSlot("task_plan"))?,
            ),
        };

        let Some(step) = coder.current_step().cloned() else {
            // Terminal condition: all steps consumed, filesystem
            // untouched.
            return Ok(StateUpdate {
                coder: Some(coder),
                status: Some(RunStatus::Done),
                ..Default::default()
            });
        };

        tracing::info!(
            step = coder.current_step_idx,
            file = %step.filepath,
            "executing implementation step"
        );

        let existing_content = self.workspace.read_file(&step.filepath)?;
        let system_prompt = prompts::coder_system_prompt();
        let task_prompt = prompts::coder_task_prompt(&step, &existing_content);

        let outcome = self
            .agent
            .run(&self.workspace, &system_prompt, &task_prompt)
            .await?;

        // Exactly one write to the target path is the sanctioned
        // outcome; anything else is a deviation worth surfacing, but
        // not a failure.
        match outcome.writes {
            1 => {}
            0 => tracing::warn!(
                step = coder.current_step_idx,
                file = %step.filepath,
                "step finished without writing (no-op advance)"
            ),
            n => tracing::warn!(
                step = coder.current_step_idx,
                file = %step.filepath,
                writes = n,
                "step performed multiple writes"
            ),
        }

        tracing::info!(
            step = coder.current_step_idx,
            reasoning_steps = outcome.steps_used,
            tool_calls = outcome.tool_calls,
            summary = %outcome.final_text,
            "step complete"
        );

        Ok(StateUpdate {
            coder: Some(coder.advanced()),
            ..Default::default()
        })
    }
}
