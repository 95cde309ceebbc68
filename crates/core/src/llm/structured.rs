//! # Structured Generation Adapter
//!
//! One request, one schema-valid value. The target type's JSON schema
//! is rendered into the prompt as format instructions; the reply is
//! scanned for its first JSON object (models wrap output in code
//! fences and prose more often than not) and decoded. Any failure to
//! locate or decode JSON is a schema violation surfaced to the caller,
//! never retried here.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use super::GenerationBackend;
use crate::error::OrchestratorError;

/// Schema-constrained wrapper around a [`GenerationBackend`].
pub struct StructuredFunction<T> {
    backend: Arc<dyn GenerationBackend>,
    _output: PhantomData<T>,
}

impl<T: DeserializeOwned + JsonSchema> StructuredFunction<T> {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            _output: PhantomData,
        }
    }

    /// Format instructions appended to every prompt: the output
    /// contract plus the target type's JSON schema.
    pub fn format_instructions() -> String {
        let schema = schemars::schema_for!(T);
        let rendered =
            serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
        format!(
            "Respond with a single JSON object and nothing else. \
             It must conform to this JSON schema:\n{rendered}"
        )
    }

    /// Issue one backend call and decode the reply into `T`.
    pub async fn run(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<T, OrchestratorError> {
        let full_prompt = format!("{prompt}\n\n{}", Self::format_instructions());
        let raw = self.backend.complete(system, &full_prompt).await?;

        let json = extract_json(&raw).ok_or_else(|| OrchestratorError::SchemaViolation {
            detail: "no JSON object found in reply".to_string(),
            raw: raw.clone(),
        })?;

        serde_json::from_str(json).map_err(|e| OrchestratorError::SchemaViolation {
            detail: e.to_string(),
            raw: raw.clone(),
        })
    }
}

/// Locate the first balanced JSON object in `text`.
///
/// Tolerates markdown fences and surrounding prose; respects string
/// literals and escapes while balancing braces.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
