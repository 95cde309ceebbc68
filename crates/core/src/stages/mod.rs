//! # Pipeline Stages
//!
//! Planner, Architect, and Coder. Each stage consumes the current
//! [`crate::state::RunState`] and returns a partial
//! [`crate::state::StateUpdate`]; the graph driver owns sequencing and
//! merging. Stages never swallow collaborator errors.

pub mod architect;
pub mod coder;
pub mod planner;
pub mod prompts;

pub use architect::ArchitectStage;
pub use coder::CoderStage;
pub use planner::PlannerStage;
