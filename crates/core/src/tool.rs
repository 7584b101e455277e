//! Tool invocation and result types, plus the parameter vocabulary
//! tools use to describe their input schema to the oracle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::ToolDefinition;

/// A request to execute a tool, as emitted by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique invocation ID (matches the oracle's `tool_use.id`)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

/// The result of one tool invocation.
///
/// Exactly one of `payload` / `error` is set. Dispatch never raises; every
/// failure becomes a `ToolResult` with `success == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The invocation ID this result answers
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// Structured output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Error description on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Render the result as the JSON text block handed back to the oracle.
    ///
    /// Object payloads get a `success` field merged in; failures become
    /// `{"success": false, "error": ...}`.
    pub fn to_content(&self) -> String {
        let value = match (&self.payload, &self.error) {
            (Some(serde_json::Value::Object(map)), _) if self.success => {
                let mut map = map.clone();
                map.insert("success".into(), serde_json::Value::Bool(true));
                serde_json::Value::Object(map)
            }
            (Some(other), _) if self.success => {
                serde_json::json!({ "success": true, "result": other })
            }
            (_, error) => serde_json::json!({
                "success": false,
                "error": error.clone().unwrap_or_else(|| "unknown error".into()),
            }),
        };
        value.to_string()
    }
}

/// Something that can run the oracle's tool invocations.
///
/// `dispatch` never fails: every problem becomes a failed [`ToolResult`]
/// carrying the invocation's id.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The catalog advertised to the oracle.
    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn dispatch(&self, call: &ToolCall) -> ToolResult;
}

/// JSON type of a declared tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
        }
    }
}

/// Default value a parameter takes when the oracle omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Str(&'static str),
    Int(i64),
}

/// One declared parameter of a tool's input schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub required: bool,
    pub description: &'static str,
    pub default: Option<ParamDefault>,
    /// Allowed values (empty = unrestricted)
    pub choices: &'static [&'static str],
}

impl ParamSpec {
    /// A required parameter.
    pub const fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            default: None,
            choices: &[],
        }
    }

    /// An optional parameter.
    pub const fn optional(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
            default: None,
            choices: &[],
        }
    }

    pub const fn with_default(mut self, default: ParamDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn with_choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }
}

/// Build a JSON-Schema `object` from parameter specs.
pub fn input_schema(params: &[ParamSpec]) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    for p in params {
        let mut prop = serde_json::Map::new();
        prop.insert("type".into(), p.kind.as_str().into());
        if !p.description.is_empty() {
            prop.insert("description".into(), p.description.into());
        }
        if !p.choices.is_empty() {
            prop.insert("enum".into(), serde_json::json!(p.choices));
        }
        match p.default {
            Some(ParamDefault::Str(s)) => {
                prop.insert("default".into(), s.into());
            }
            Some(ParamDefault::Int(n)) => {
                prop.insert("default".into(), n.into());
            }
            None => {}
        }
        properties.insert(p.name.into(), serde_json::Value::Object(prop));
    }

    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Assemble a [`ToolDefinition`] from its parts.
pub fn definition(name: &str, description: &str, params: &[ParamSpec]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: input_schema(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &[ParamSpec] = &[
        ParamSpec::required("subreddit", ParamType::String, "Community name"),
        ParamSpec::optional("time_filter", ParamType::String, "")
            .with_choices(&["day", "week", "month"])
            .with_default(ParamDefault::Str("week")),
        ParamSpec::optional("limit", ParamType::Integer, "").with_default(ParamDefault::Int(10)),
    ];

    #[test]
    fn schema_lists_properties_and_required() {
        let schema = input_schema(PARAMS);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["subreddit"]));
        assert_eq!(schema["properties"]["subreddit"]["type"], "string");
        assert_eq!(schema["properties"]["time_filter"]["default"], "week");
        assert_eq!(
            schema["properties"]["time_filter"]["enum"],
            serde_json::json!(["day", "week", "month"])
        );
        assert_eq!(schema["properties"]["limit"]["default"], 10);
        assert!(schema["properties"]["limit"].get("description").is_none());
    }

    #[test]
    fn empty_schema_has_empty_required() {
        let schema = input_schema(&[]);
        assert_eq!(schema["required"], serde_json::json!([]));
        assert!(schema["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn ok_content_merges_success_flag() {
        let result = ToolResult::ok("call_1", serde_json::json!({"total": 3}));
        let content: serde_json::Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(content["success"], true);
        assert_eq!(content["total"], 3);
    }

    #[test]
    fn failure_content_carries_error() {
        let result = ToolResult::failure("call_2", "Unknown tool: launch_rocket");
        assert!(!result.success);
        let content: serde_json::Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(content["success"], false);
        assert_eq!(content["error"], "Unknown tool: launch_rocket");
    }
}
