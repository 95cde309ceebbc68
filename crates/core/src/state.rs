//! # Orchestration State
//!
//! Typed artifacts carried between pipeline stages, plus the
//! fixed-shape run state they are threaded through.
//!
//! `Plan` and `TaskPlan` double as LLM output schemas: the structured
//! generation adapter renders their JSON schema into the prompt and
//! decodes the backend's reply into them. `TaskPlan::plan` is the one
//! exception - the backend is not trusted to echo the plan losslessly,
//! so the field is skipped in both serde and the schema and attached
//! by the Architect after decoding.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One deliverable file in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanFile {
    /// Relative path of the file to create or modify
    pub path: String,
    /// Short description of what this file is for
    pub purpose: String,
}

/// High-level decomposition of a user request into named deliverables.
///
/// Produced once by the Planner and immutable afterward; the Architect
/// reads it, never rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Human-readable description of the overall goal
    pub description: String,
    /// Files to create or modify, each with an intent
    pub files: Vec<PlanFile>,
}

impl Plan {
    /// Check the planner's structural invariants: every file entry
    /// needs a non-empty path and a non-empty purpose.
    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("plan description is empty".to_string());
        }
        for (idx, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(format!("plan file #{idx} has an empty path"));
            }
            if file.purpose.trim().is_empty() {
                return Err(format!("plan file '{}' has an empty purpose", file.path));
            }
        }
        Ok(())
    }
}

/// One atomic file-level task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImplementationStep {
    /// Relative path of the file this step edits
    pub filepath: String,
    /// What to change at that path, actionable with only the file's
    /// current contents as extra context
    pub task_description: String,
}

/// Ordered execution plan derived from a [`Plan`].
///
/// Step order is execution order: later steps may depend on files
/// written by earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskPlan {
    /// The originating plan, attached by the Architect after decoding.
    /// Excluded from the generation schema on purpose.
    #[serde(skip)]
    #[schemars(skip)]
    pub plan: Option<Arc<Plan>>,
    /// Steps in execution order
    pub implementation_steps: Vec<ImplementationStep>,
}

/// Progress cursor over a [`TaskPlan`].
///
/// Owned by the Coder stage. The cursor only moves forward, one step
/// per advancing invocation; `len(steps)` denotes completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoderState {
    /// The plan being executed
    pub task_plan: TaskPlan,
    /// Zero-based index of the next step to execute
    pub current_step_idx: usize,
}

impl CoderState {
    /// Fresh cursor at the start of a task plan.
    pub fn new(task_plan: TaskPlan) -> Self {
        Self {
            task_plan,
            current_step_idx: 0,
        }
    }

    /// The step the cursor points at, or `None` once all steps are
    /// consumed.
    pub fn current_step(&self) -> Option<&ImplementationStep> {
        self.task_plan
            .implementation_steps
            .get(self.current_step_idx)
    }

    /// Whether every step has been consumed.
    pub fn is_complete(&self) -> bool {
        self.current_step_idx >= self.task_plan.implementation_steps.len()
    }

    /// A new state with the cursor moved forward by exactly one step.
    /// The driver threads the returned value forward; the old value is
    /// never mutated in place.
    pub fn advanced(&self) -> Self {
        Self {
            task_plan: self.task_plan.clone(),
            current_step_idx: self.current_step_idx + 1,
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// All implementation steps consumed
    Done,
}

/// Full orchestration state threaded through every stage.
///
/// Fixed-shape record with explicitly optional slots rather than an
/// open-ended map: each slot is populated by exactly one stage and
/// never cleared afterward.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    /// The original user request, set once at run start
    pub user_prompt: String,
    /// Set by the Planner
    pub plan: Option<Arc<Plan>>,
    /// Set by the Architect
    pub task_plan: Option<TaskPlan>,
    /// Created and advanced by the Coder
    pub coder: Option<CoderState>,
    /// Set by the Coder once all steps are consumed
    pub status: Option<RunStatus>,
}

impl RunState {
    /// Initial state for a new run.
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            plan: None,
            task_plan: None,
            coder: None,
            status: None,
        }
    }

    /// Whether the run reached its terminal status.
    pub fn is_done(&self) -> bool {
        self.status == Some(RunStatus::Done)
    }

    /// Merge a stage's partial update into this state. Slots are
    /// additive: an unset slot in the update leaves the current value
    /// untouched.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
        if let Some(task_plan) = update.task_plan {
            self.task_plan = Some(task_plan);
        }
        if let Some(coder) = update.coder {
            self.coder = Some(coder);
        }
        if let Some(status) = update.status {
            self.status = Some(status);
        }
    }
}

/// Partial state returned by a stage invocation. Every field a stage
/// leaves as `None` is left alone by [`RunState::apply`].
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub plan: Option<Arc<Plan>>,
    pub task_plan: Option<TaskPlan>,
    pub coder: Option<CoderState>,
    pub status: Option<RunStatus>,
}
