//! Default prompt templates bundled at compile time, plus the
//! renderers that combine them with per-run inputs.

use crate::state::ImplementationStep;
use crate::tools::TOOL_CATALOG;

/// Planner - decomposes a user request into deliverable files
pub const PLANNER: &str = include_str!("defaults/planner.md");

/// Architect - expands a plan into ordered implementation steps
pub const ARCHITECT: &str = include_str!("defaults/architect.md");

/// Coder - executes one implementation step with tools
pub const CODER: &str = include_str!("defaults/coder.md");

/// User prompt for the planner stage.
pub fn planner_prompt(user_prompt: &str) -> String {
    format!("Build request:\n{user_prompt}")
}

/// User prompt for the architect stage, over the serialized plan.
pub fn architect_prompt(plan_json: &str) -> String {
    format!("Plan to expand into implementation steps:\n{plan_json}")
}

/// System prompt for the coder agent, with the tool call formats
/// appended.
pub fn coder_system_prompt() -> String {
    format!("{CODER}\nTool call formats:\n{TOOL_CATALOG}")
}

/// Per-task user prompt for the coder agent.
pub fn coder_task_prompt(step: &ImplementationStep, existing_content: &str) -> String {
    format!(
        "Task: {}\nFile: {}\nExisting content:\n{}\n\n\
         Use write_file to save your changes.",
        step.task_description, step.filepath, existing_content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_bundled() {
        assert!(PLANNER.contains("planning agent"));
        assert!(ARCHITECT.contains("implementation steps"));
        assert!(CODER.contains("write_file"));
    }

    #[test]
    fn coder_system_prompt_lists_tools() {
        let prompt = coder_system_prompt();
        assert!(prompt.contains("read_file"));
        assert!(prompt.contains("get_current_directory"));
    }

    #[test]
    fn coder_task_prompt_embeds_context() {
        let step = ImplementationStep {
            filepath: "calc.py".to_string(),
            task_description: "add a divide function".to_string(),
        };
        let prompt = coder_task_prompt(&step, "def add(a, b): ...");
        assert!(prompt.contains("calc.py"));
        assert!(prompt.contains("add a divide function"));
        assert!(prompt.contains("def add"));
    }
}
