//! # Architect Stage
//!
//! Expands a [`Plan`] into an ordered [`TaskPlan`]. The backend only
//! produces the step list; the authoritative plan object is attached
//! locally afterward, so downstream stages always see the exact plan
//! the planner produced rather than a lossy echo.

use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::llm::{GenerationBackend, StructuredFunction};
use crate::state::{RunState, StateUpdate, TaskPlan};

use super::prompts;

/// Architecture stage over a shared generation backend.
pub struct ArchitectStage {
    backend: Arc<dyn GenerationBackend>,
}

impl ArchitectStage {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Produce a state update setting the task-plan slot.
    pub async fn run(&self, state: &RunState) -> Result<StateUpdate, OrchestratorError> {
        let plan = state
            .plan
            .as_ref()
            .ok_or(OrchestratorError::MissingSlot("plan"))?
            .clone();

        let plan_json = serde_json::to_string_pretty(plan.as_ref()).unwrap_or_default();
        let func = StructuredFunction::<TaskPlan>::new(self.backend.clone());

        let mut task_plan = func
            .run(Some(prompts::ARCHITECT), &prompts::architect_prompt(&plan_json))
            .await?;

        // Attach the authoritative plan; the decoded value carries
        // none (the field is schema-skipped).
        task_plan.plan = Some(plan.clone());

        if task_plan.implementation_steps.is_empty() && !plan.files.is_empty() {
            return Err(OrchestratorError::SchemaViolation {
                detail: format!(
                    "architect produced no steps for a plan with {} files",
                    plan.files.len()
                ),
                raw: plan_json,
            });
        }

        tracing::info!(
            steps = task_plan.implementation_steps.len(),
            "task plan generated"
        );

        Ok(StateUpdate {
            task_plan: Some(task_plan),
            ..Default::default()
        })
    }
}
