//! # Error Taxonomy
//!
//! Typed failure classes for the orchestration core. Stages never
//! swallow these: every error from a collaborator propagates unchanged
//! to the graph driver, which halts the run and hands the accumulated
//! state back to the caller. Retry policies, where wanted, wrap stage
//! invocations externally.

use crate::llm::LlmError;

/// Errors surfaced by the orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The generation backend's reply could not be decoded into the
    /// requested schema. The adapter never retries this itself.
    #[error("schema violation: {detail}")]
    SchemaViolation {
        /// What failed during extraction or decoding.
        detail: String,
        /// The raw backend reply, kept for diagnostics.
        raw: String,
    },

    /// Filesystem failure during a tool call. A step that fails this
    /// way does not advance the coder cursor, so re-invocation retries
    /// the same step.
    #[error("io failure at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The bounded agent loop exhausted its step budget without
    /// reaching a final answer.
    #[error("agent did not converge within {steps} reasoning steps")]
    Convergence { steps: usize },

    /// The run-level transition ceiling was hit. Always fatal.
    #[error("run exceeded the transition ceiling of {ceiling}")]
    CeilingExceeded { ceiling: usize },

    /// A stage was invoked before its predecessor populated the slot
    /// it reads. Indicates a defective driver, not a backend problem.
    #[error("state slot '{0}' is not populated")]
    MissingSlot(&'static str),

    /// Transport or API failure from the generation backend.
    #[error(transparent)]
    Backend(#[from] LlmError),
}

impl OrchestratorError {
    /// Short machine-readable name for the error class, used in run
    /// events and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaViolation { .. } => "schema_violation",
            Self::Io { .. } => "io_failure",
            Self::Convergence { .. } => "convergence_failure",
            Self::CeilingExceeded { .. } => "ceiling_exceeded",
            Self::MissingSlot(_) => "missing_slot",
            Self::Backend(_) => "backend",
        }
    }
}
