//! # Tool Surface
//!
//! The four filesystem capabilities granted to the coding agent:
//! `read_file`, `write_file`, `list_files`, `get_current_directory`.
//! All of them resolve against a single workspace root.
//!
//! Dispatch distinguishes agent mistakes from real failures: an
//! unknown tool name or malformed arguments become an error
//! observation fed back to the agent, while genuine filesystem errors
//! propagate to the orchestrator and fail the step.

pub mod file_tools;

pub use file_tools::Workspace;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::OrchestratorError;

/// A tool invocation proposed by the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub tool: String,
    /// Tool arguments as a JSON object
    #[serde(default)]
    pub args: Value,
}

/// One-line summary of the available tools, injected into the coder
/// system prompt.
pub const TOOL_CATALOG: &str = "\
- read_file: {\"tool\": \"read_file\", \"args\": {\"path\": \"relative/path\"}}
- write_file: {\"tool\": \"write_file\", \"args\": {\"path\": \"relative/path\", \"content\": \"...\"}}
- list_files: {\"tool\": \"list_files\", \"args\": {\"path\": \"relative/path\"}}
- get_current_directory: {\"tool\": \"get_current_directory\", \"args\": {}}";

/// Execute one tool call against the workspace.
///
/// Returns the observation payload handed back to the agent. `Err` is
/// reserved for filesystem failures; everything the agent can recover
/// from (unknown tool, missing argument) comes back as an error-shaped
/// observation instead.
pub fn dispatch(workspace: &Workspace, call: &ToolCall) -> Result<Value, OrchestratorError> {
    match call.tool.as_str() {
        "read_file" => {
            let Some(path) = str_arg(&call.args, "path") else {
                return Ok(missing_arg("read_file", "path"));
            };
            let content = workspace.read_file(path)?;
            Ok(json!({
                "path": path,
                "content": content,
                "lines": content.lines().count(),
            }))
        }
        "write_file" => {
            let Some(path) = str_arg(&call.args, "path") else {
                return Ok(missing_arg("write_file", "path"));
            };
            let Some(content) = str_arg(&call.args, "content") else {
                return Ok(missing_arg("write_file", "content"));
            };
            workspace.write_file(path, content)?;
            Ok(json!({
                "path": path,
                "bytes_written": content.len(),
            }))
        }
        "list_files" => {
            let path = str_arg(&call.args, "path").unwrap_or(".");
            let entries = workspace.list_files(path)?;
            Ok(json!({
                "path": path,
                "entries": entries,
            }))
        }
        "get_current_directory" => Ok(json!({
            "cwd": workspace.current_dir().display().to_string(),
        })),
        other => Ok(json!({
            "error": format!("unknown tool '{other}'"),
        })),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn missing_arg(tool: &str, key: &str) -> Value {
    json!({ "error": format!("{tool} requires a string '{key}' argument") })
}
