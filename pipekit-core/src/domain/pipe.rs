//! Pipe domain types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A workflow submission unit
///
/// Holds Pipekit ownership metadata and the workflow definition to be run.
/// The workflow document is opaque to this crate: it is carried as raw JSON
/// and forwarded to the service unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    #[serde(rename = "Pipekit", default)]
    pub pipekit: PipekitMeta,
    #[serde(rename = "Argo", default)]
    pub workflow: Option<serde_json::Value>,
}

/// Metadata specific to interacting with the Pipekit API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PipekitMeta {
    pub pipe_name: String,
    pub user_id: String,
    pub pipe_id: String,
    pub run_id: String,
    pub cluster: String,
    pub secrets_environment: String,
    pub namespace: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

impl Pipe {
    /// Creates a pipe owned by `user_id` with no workflow attached
    pub fn new(user_id: impl Into<String>, pipe_id: impl Into<String>) -> Self {
        Self {
            pipekit: PipekitMeta {
                user_id: user_id.into(),
                pipe_id: pipe_id.into(),
                ..Default::default()
            },
            workflow: None,
        }
    }

    /// Attaches a workflow definition
    pub fn with_workflow(mut self, workflow: serde_json::Value) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.pipekit.user_id
    }

    pub fn pipe_id(&self) -> &str {
        &self.pipekit.pipe_id
    }

    pub fn run_id(&self) -> &str {
        &self.pipekit.run_id
    }

    /// Overlays a service response onto this pipe
    ///
    /// Only the keys present in `response` change. Objects are merged key by
    /// key, so a reply of `{"Pipekit":{"RunId":"r9"}}` sets the run id and
    /// keeps everything else. A `null` clears tags and the workflow but
    /// leaves scalar fields alone. The pipe is untouched if the merged
    /// document does not decode.
    pub fn merge_response(&mut self, response: Value) -> serde_json::Result<()> {
        let mut merged = serde_json::to_value(&*self)?;
        overlay(&mut merged, response);
        *self = serde_json::from_value(merged)?;
        Ok(())
    }
}

fn overlay(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::String(_) | Value::Number(_) | Value::Bool(_), Value::Null) => {}
        (target, patch) => *target = patch,
    }
}

/// Servers written against nil slices send `null` for an empty tag list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipe_serializes_pascal_case_metadata() {
        let pipe = Pipe::new("u1", "p1").with_workflow(json!({ "kind": "Workflow" }));
        let value = serde_json::to_value(&pipe).unwrap();

        assert_eq!(value["Pipekit"]["UserId"], "u1");
        assert_eq!(value["Pipekit"]["PipeId"], "p1");
        assert_eq!(value["Pipekit"]["SecretsEnvironment"], "");
        assert_eq!(value["Argo"]["kind"], "Workflow");
    }

    #[test]
    fn test_pipe_accepts_null_tags_and_missing_fields() {
        let pipe: Pipe = serde_json::from_value(json!({
            "Pipekit": { "UserId": "u1", "PipeId": "p1", "RunId": "r1", "Tags": null },
            "Argo": null
        }))
        .unwrap();

        assert_eq!(pipe.user_id(), "u1");
        assert_eq!(pipe.pipe_id(), "p1");
        assert_eq!(pipe.run_id(), "r1");
        assert!(pipe.pipekit.tags.is_empty());
        assert!(pipe.workflow.is_none());
    }

    #[test]
    fn test_merge_response_keeps_absent_fields() {
        let mut pipe = Pipe::new("u1", "p1").with_workflow(json!({ "kind": "Workflow" }));
        pipe.pipekit.tags = vec!["nightly".to_string()];

        pipe.merge_response(json!({ "Pipekit": { "RunId": "r9" } }))
            .unwrap();

        assert_eq!(pipe.user_id(), "u1");
        assert_eq!(pipe.pipe_id(), "p1");
        assert_eq!(pipe.run_id(), "r9");
        assert_eq!(pipe.pipekit.tags, vec!["nightly".to_string()]);
        assert_eq!(pipe.workflow, Some(json!({ "kind": "Workflow" })));
    }

    #[test]
    fn test_merge_response_nulls() {
        let mut pipe = Pipe::new("u1", "p1").with_workflow(json!({ "kind": "Workflow" }));
        pipe.pipekit.tags = vec!["nightly".to_string()];

        pipe.merge_response(json!({
            "Pipekit": { "UserId": null, "Tags": null },
            "Argo": null
        }))
        .unwrap();

        assert_eq!(pipe.user_id(), "u1");
        assert!(pipe.pipekit.tags.is_empty());
        assert!(pipe.workflow.is_none());
    }

    #[test]
    fn test_merge_response_merges_workflow_objects() {
        let mut pipe = Pipe::new("u1", "p1").with_workflow(json!({
            "metadata": { "generateName": "hello-" }
        }));

        pipe.merge_response(json!({ "Argo": { "metadata": { "name": "hello-x7k2" } } }))
            .unwrap();

        let workflow = pipe.workflow.unwrap();
        assert_eq!(workflow["metadata"]["generateName"], "hello-");
        assert_eq!(workflow["metadata"]["name"], "hello-x7k2");
    }

    #[test]
    fn test_merge_response_rejects_mistyped_fields() {
        let original = Pipe::new("u1", "p1");
        let mut pipe = original.clone();

        let result = pipe.merge_response(json!({ "Pipekit": { "RunId": 42 } }));
        assert!(result.is_err());
        assert_eq!(pipe, original);
    }

    #[test]
    fn test_pipe_from_empty_object() {
        let pipe: Pipe = serde_json::from_str("{}").unwrap();
        assert_eq!(pipe, Pipe::default());
    }
}
