//! # Bounded Agent Loop
//!
//! The tool-using reasoning loop that performs one implementation
//! step's actual edit. The loop is explicit: the model proposes either
//! a tool call or a final answer each turn; tool calls execute against
//! the workspace and their observations feed back into the transcript.
//! The step budget is a hard ceiling - exhausting it is a convergence
//! failure, never a silent stop.

use serde_json::json;
use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::llm::structured::extract_json;
use crate::llm::GenerationBackend;
use crate::tools::{self, ToolCall, Workspace};

/// What the agent produced once it stopped calling tools.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// The agent's final answer text.
    pub final_text: String,
    /// Reasoning turns consumed (1-based; includes the final turn).
    pub steps_used: usize,
    /// Tool calls executed across the loop.
    pub tool_calls: usize,
    /// Successful `write_file` calls during this loop.
    pub writes: usize,
}

/// One turn's parsed action.
enum AgentAction {
    Tool(ToolCall),
    Final(String),
}

/// Parse a model reply into an action.
///
/// A JSON object carrying a `"tool"` key is a tool call; a `"final"`
/// key is an explicit final answer; anything else (prose, unparseable
/// output) counts as a final answer with no further tool call.
fn parse_action(reply: &str) -> AgentAction {
    if let Some(candidate) = extract_json(reply) {
        if let Ok(call) = serde_json::from_str::<ToolCall>(candidate) {
            return AgentAction::Tool(call);
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
            if let Some(answer) = value.get("final").and_then(|v| v.as_str()) {
                return AgentAction::Final(answer.to_string());
            }
        }
    }
    AgentAction::Final(reply.trim().to_string())
}

/// Bounded propose-execute-observe loop over a generation backend and
/// the workspace tool surface.
pub struct AgentLoop {
    backend: Arc<dyn GenerationBackend>,
    max_steps: usize,
}

impl AgentLoop {
    /// Default reasoning-step budget per implementation step.
    pub const DEFAULT_MAX_STEPS: usize = 16;

    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }

    /// Override the step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run the loop to a final answer or a convergence failure.
    ///
    /// Filesystem errors from tool execution propagate immediately;
    /// the caller decides whether to retry the step.
    pub async fn run(
        &self,
        workspace: &Workspace,
        system: &str,
        task: &str,
    ) -> Result<AgentOutcome, OrchestratorError> {
        let mut transcript = task.to_string();
        let mut tool_calls = 0usize;
        workspace.reset_writes();

        for step in 1..=self.max_steps {
            let reply = self.backend.complete(Some(system), &transcript).await?;

            match parse_action(&reply) {
                AgentAction::Final(final_text) => {
                    tracing::debug!(steps = step, tool_calls, "agent reached final answer");
                    return Ok(AgentOutcome {
                        final_text,
                        steps_used: step,
                        tool_calls,
                        writes: workspace.writes(),
                    });
                }
                AgentAction::Tool(call) => {
                    tool_calls += 1;
                    tracing::debug!(tool = %call.tool, step, "executing tool call");
                    let observation = tools::dispatch(workspace, &call)?;
                    let action = json!({ "tool": call.tool, "args": call.args });
                    transcript.push_str(&format!(
                        "\n\nAction:\n{action}\n\nObservation:\n{observation}"
                    ));
                }
            }
        }

        Err(OrchestratorError::Convergence {
            steps: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct ScriptedBackend {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn complete(&self, _system: Option<&str>, _prompt: &str) -> Result<String, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
        }
    }

    #[test]
    fn parse_tool_call() {
        let action = parse_action(r#"{"tool": "read_file", "args": {"path": "a.py"}}"#);
        assert!(matches!(action, AgentAction::Tool(c) if c.tool == "read_file"));
    }

    #[test]
    fn parse_explicit_final() {
        let action = parse_action(r#"{"final": "all done"}"#);
        assert!(matches!(action, AgentAction::Final(t) if t == "all done"));
    }

    #[test]
    fn parse_prose_as_final() {
        let action = parse_action("I wrote the file, everything is in place.");
        assert!(matches!(action, AgentAction::Final(_)));
    }

    #[tokio::test]
    async fn loop_writes_then_finishes() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let backend = ScriptedBackend::new(&[
            r#"{"tool": "write_file", "args": {"path": "a.py", "content": "X=1"}}"#,
            r#"{"final": "wrote a.py"}"#,
        ]);

        let outcome = AgentLoop::new(backend)
            .run(&ws, "system", "write a.py")
            .await
            .unwrap();

        assert_eq!(outcome.final_text, "wrote a.py");
        assert_eq!(outcome.steps_used, 2);
        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(outcome.writes, 1);
        assert_eq!(ws.read_file("a.py").unwrap(), "X=1");
    }

    #[tokio::test]
    async fn loop_feeds_observations_back() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.write_file("a.py", "X=1").unwrap();

        struct EchoBackend {
            prompts: Mutex<Vec<String>>,
            replies: Mutex<VecDeque<String>>,
        }

        #[async_trait]
        impl GenerationBackend for EchoBackend {
            async fn complete(
                &self,
                _system: Option<&str>,
                prompt: &str,
            ) -> Result<String, LlmError> {
                self.prompts.lock().unwrap().push(prompt.to_string());
                Ok(self.replies.lock().unwrap().pop_front().unwrap())
            }
        }

        let backend = Arc::new(EchoBackend {
            prompts: Mutex::new(Vec::new()),
            replies: Mutex::new(
                [
                    r#"{"tool": "read_file", "args": {"path": "a.py"}}"#.to_string(),
                    "done".to_string(),
                ]
                .into_iter()
                .collect(),
            ),
        });

        AgentLoop::new(backend.clone())
            .run(&ws, "system", "inspect a.py")
            .await
            .unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        // The second turn sees the read observation.
        assert!(prompts[1].contains("X=1"));
        assert!(prompts[1].contains("Observation"));
    }

    #[tokio::test]
    async fn budget_exhaustion_is_convergence_failure() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let backend = ScriptedBackend::new(&[
            r#"{"tool": "get_current_directory", "args": {}}"#,
            r#"{"tool": "get_current_directory", "args": {}}"#,
            r#"{"tool": "get_current_directory", "args": {}}"#,
        ]);

        let err = AgentLoop::new(backend)
            .with_max_steps(3)
            .run(&ws, "system", "spin forever")
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Convergence { steps: 3 }));
    }

    #[tokio::test]
    async fn unknown_tool_observation_keeps_loop_alive() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let backend = ScriptedBackend::new(&[
            r#"{"tool": "run_shell", "args": {"cmd": "rm -rf /"}}"#,
            "giving up on shell access",
        ]);

        let outcome = AgentLoop::new(backend)
            .run(&ws, "system", "task")
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(outcome.writes, 0);
    }
}
