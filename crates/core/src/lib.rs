//! # Buildpilot Core
//!
//! The orchestration core of Buildpilot: a staged, LLM-driven
//! code-generation pipeline. A free-text build request flows through
//! the Planner (high-level plan), the Architect (ordered file-level
//! steps), and the Coder (one step per invocation via a bounded
//! tool-using agent loop) until every step is consumed.
//!
//! ## Architecture
//!
//! - `state` - typed artifacts (Plan, TaskPlan, CoderState) and the
//!   fixed-shape run state threaded through stages
//! - `llm/` - generation backend seam, provider clients, and the
//!   structured generation adapter
//! - `tools/` - the four filesystem capabilities granted to the agent
//! - `agent` - the bounded propose-execute-observe loop
//! - `stages/` - Planner, Architect, Coder stage functions
//! - `graph/` - transition table, driver loop, run events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use buildpilot_core::graph::Orchestrator;
//! use buildpilot_core::models::ModelConfig;
//! use buildpilot_core::tools::Workspace;
//! use std::sync::Arc;
//!
//! let backend = ModelConfig::default().create_backend()?;
//! let workspace = Arc::new(Workspace::new("."));
//! let state = Orchestrator::new(backend, workspace)
//!     .run("Build a calculator")
//!     .await?;
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod models;
pub mod stages;
pub mod state;
pub mod tools;

pub use error::OrchestratorError;
pub use graph::{Orchestrator, RunError};
