//! End-to-end orchestration runs against a scripted backend and a
//! temporary workspace. No network, no real model: the script plays
//! the generation service, turn by turn.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use buildpilot_core::error::OrchestratorError;
use buildpilot_core::graph::{GraphNode, Orchestrator, RunEventKind};
use buildpilot_core::llm::{GenerationBackend, LlmError};
use buildpilot_core::stages::CoderStage;
use buildpilot_core::state::{RunState, RunStatus};
use buildpilot_core::tools::Workspace;

/// Plays scripted replies in order and records every prompt it saw.
struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, idx: usize) -> String {
        self.prompts.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(&self, _system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

const PLAN_REPLY: &str = r#"{
    "description": "Two-file demo",
    "files": [
        {"path": "a.py", "purpose": "constants"},
        {"path": "b.py", "purpose": "consumer of a.py"}
    ]
}"#;

const TASK_PLAN_REPLY: &str = r#"{
    "implementation_steps": [
        {"filepath": "a.py", "task_description": "define X=1"},
        {"filepath": "b.py", "task_description": "read a.py and mirror its value"}
    ]
}"#;

#[tokio::test]
async fn full_run_executes_steps_in_order() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&[
        PLAN_REPLY,
        TASK_PLAN_REPLY,
        // Step 0: write a.py, then finish.
        r#"{"tool": "write_file", "args": {"path": "a.py", "content": "X=1"}}"#,
        r#"{"final": "wrote a.py"}"#,
        // Step 1: read a.py first, then write b.py, then finish.
        r#"{"tool": "read_file", "args": {"path": "a.py"}}"#,
        r#"{"tool": "write_file", "args": {"path": "b.py", "content": "Y=X"}}"#,
        r#"{"final": "wrote b.py"}"#,
    ]);

    let state = Orchestrator::new(backend.clone(), workspace.clone())
        .run("Build the two-file demo")
        .await
        .unwrap();

    assert_eq!(state.status, Some(RunStatus::Done));
    assert_eq!(state.coder.as_ref().unwrap().current_step_idx, 2);
    assert_eq!(workspace.read_file("a.py").unwrap(), "X=1");
    assert_eq!(workspace.read_file("b.py").unwrap(), "Y=X");

    // Strict sequencing: step 1's second turn observed step 0's write.
    assert!(backend.prompt(5).contains("X=1"));

    // Planner + architect + two agent turns + three agent turns; the
    // terminal coder invocation makes no backend call.
    assert_eq!(backend.calls(), 7);
}

#[tokio::test]
async fn task_plan_references_the_planner_plan_instance() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&[
        PLAN_REPLY,
        TASK_PLAN_REPLY,
        r#"{"tool": "write_file", "args": {"path": "a.py", "content": "X=1"}}"#,
        r#"{"final": "ok"}"#,
        r#"{"tool": "write_file", "args": {"path": "b.py", "content": "Y=X"}}"#,
        r#"{"final": "ok"}"#,
    ]);

    let state = Orchestrator::new(backend, workspace)
        .run("Build the two-file demo")
        .await
        .unwrap();

    let plan = state.plan.as_ref().unwrap();
    let attached = state
        .task_plan
        .as_ref()
        .unwrap()
        .plan
        .as_ref()
        .unwrap();
    assert!(Arc::ptr_eq(plan, attached));
}

#[tokio::test]
async fn coder_terminal_state_is_idempotent() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&[
        // Three steps, two turns each: one write, one final answer.
        r#"{"tool": "write_file", "args": {"path": "f0.py", "content": "0"}}"#,
        r#"{"final": "ok"}"#,
        r#"{"tool": "write_file", "args": {"path": "f1.py", "content": "1"}}"#,
        r#"{"final": "ok"}"#,
        r#"{"tool": "write_file", "args": {"path": "f2.py", "content": "2"}}"#,
        r#"{"final": "ok"}"#,
    ]);

    let steps: Vec<_> = (0..3)
        .map(|i| buildpilot_core::state::ImplementationStep {
            filepath: format!("f{i}.py"),
            task_description: format!("write f{i}.py"),
        })
        .collect();
    let mut state = RunState::new("req");
    state.task_plan = Some(buildpilot_core::state::TaskPlan {
        plan: None,
        implementation_steps: steps,
    });

    let coder = CoderStage::new(backend.clone(), workspace.clone());

    // Three advancing invocations.
    for expected_cursor in 1..=3 {
        let update = coder.run(&state).await.unwrap();
        assert!(update.status.is_none());
        state.apply(update);
        assert_eq!(
            state.coder.as_ref().unwrap().current_step_idx,
            expected_cursor
        );
    }

    // Fourth invocation: DONE, no backend call, no filesystem access.
    let calls_before = backend.calls();
    let update = coder.run(&state).await.unwrap();
    assert_eq!(update.status, Some(RunStatus::Done));
    state.apply(update);
    assert_eq!(backend.calls(), calls_before);

    // Fifth invocation: still DONE, cursor pinned at 3, no writes.
    workspace.reset_writes();
    let update = coder.run(&state).await.unwrap();
    assert_eq!(update.status, Some(RunStatus::Done));
    assert_eq!(update.coder.unwrap().current_step_idx, 3);
    assert_eq!(workspace.writes(), 0);
    assert_eq!(backend.calls(), calls_before);
}

#[tokio::test]
async fn schema_violation_halts_before_architect() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&["this is not a plan, sorry"]);

    let err = Orchestrator::new(backend.clone(), workspace)
        .run("Build something")
        .await
        .unwrap_err();

    assert!(matches!(
        err.source,
        OrchestratorError::SchemaViolation { .. }
    ));
    assert_eq!(err.last_node, GraphNode::Planner);
    assert!(err.state.plan.is_none());
    // The architect never ran.
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn ceiling_aborts_with_partial_state() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&[PLAN_REPLY, TASK_PLAN_REPLY]);

    // Ceiling of 2 admits planner and architect, then aborts before
    // the first coder invocation.
    let err = Orchestrator::new(backend.clone(), workspace)
        .with_step_ceiling(2)
        .run("Build the two-file demo")
        .await
        .unwrap_err();

    assert!(matches!(
        err.source,
        OrchestratorError::CeilingExceeded { ceiling: 2 }
    ));
    assert_eq!(backend.calls(), 2);
    // Partial state survives for diagnostics.
    assert!(err.state.plan.is_some());
    assert!(err.state.task_plan.is_some());
    assert!(err.state.status.is_none());
}

#[tokio::test]
async fn run_emits_ordered_events() {
    let dir = tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(dir.path()));
    let backend = ScriptedBackend::new(&[
        r#"{"description": "one file", "files": [{"path": "a.py", "purpose": "demo"}]}"#,
        r#"{"implementation_steps": [{"filepath": "a.py", "task_description": "write it"}]}"#,
        r#"{"tool": "write_file", "args": {"path": "a.py", "content": "X=1"}}"#,
        r#"{"final": "ok"}"#,
    ]);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    Orchestrator::new(backend, workspace)
        .with_events(tx)
        .run("Build one file")
        .await
        .unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push((event.kind, event.node));
    }

    assert_eq!(kinds.first().unwrap().0, RunEventKind::RunStarted);
    assert_eq!(kinds.last().unwrap().0, RunEventKind::RunCompleted);
    assert!(kinds
        .iter()
        .any(|(k, n)| *k == RunEventKind::StepAdvanced && *n == GraphNode::Coder));
    // One advancing coder step only.
    assert_eq!(
        kinds
            .iter()
            .filter(|(k, _)| *k == RunEventKind::StepAdvanced)
            .count(),
        1
    );
}
