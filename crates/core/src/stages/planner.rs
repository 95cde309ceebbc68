//! # Planner Stage
//!
//! Translates the free-text user request into a [`Plan`]. One
//! structured generation call; a schema violation here is fatal to the
//! run unless the caller wraps this stage in a retry policy.

use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::llm::{GenerationBackend, StructuredFunction};
use crate::state::{Plan, RunState, StateUpdate};

use super::prompts;

/// Planning stage over a shared generation backend.
pub struct PlannerStage {
    backend: Arc<dyn GenerationBackend>,
}

impl PlannerStage {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Produce a state update setting the plan slot.
    ///
    /// Re-invocation with the same request may yield a different plan;
    /// the backend is non-deterministic and nothing downstream assumes
    /// otherwise.
    pub async fn run(&self, state: &RunState) -> Result<StateUpdate, OrchestratorError> {
        let func = StructuredFunction::<Plan>::new(self.backend.clone());
        let prompt = prompts::planner_prompt(&state.user_prompt);

        let plan = func.run(Some(prompts::PLANNER), &prompt).await?;

        // The backend is the untrusted party: reject structurally
        // hollow plans before they reach the architect.
        if let Err(detail) = plan.validate() {
            return Err(OrchestratorError::SchemaViolation {
                detail,
                raw: serde_json::to_string(&plan).unwrap_or_default(),
            });
        }

        tracing::info!(files = plan.files.len(), "plan generated");

        Ok(StateUpdate {
            plan: Some(Arc::new(plan)),
            ..Default::default()
        })
    }
}
