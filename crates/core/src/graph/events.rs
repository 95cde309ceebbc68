//! # Run Events
//!
//! Typed progress events emitted by the graph driver. Delivery is
//! best-effort over an unbounded channel; a closed receiver never
//! affects the run. Events are ordered by the single-threaded driver,
//! so they carry no timestamps.

use serde::Serialize;

use super::GraphNode;

/// Kind of run event.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    /// Run entered the graph
    RunStarted,
    /// A stage invocation began
    StageStarted,
    /// A stage invocation returned its update
    StageCompleted,
    /// The coder cursor moved forward
    StepAdvanced,
    /// Run reached the terminal node
    RunCompleted,
    /// Run halted on a fatal error
    RunFailed,
}

/// An event in a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    /// Kind of event
    pub kind: RunEventKind,
    /// Node the driver was at when the event fired
    pub node: GraphNode,
    /// Associated data (JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RunEvent {
    /// Create a new event.
    pub fn new(kind: RunEventKind, node: GraphNode) -> Self {
        Self {
            kind,
            node,
            data: None,
        }
    }

    /// Attach a data payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Sender half used by the driver.
pub type EventSender = tokio::sync::mpsc::UnboundedSender<RunEvent>;
