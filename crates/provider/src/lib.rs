//! Reasoning backend interface.
//!
//! The planner and executor treat the language model as an opaque
//! capability: given a conversation and a tool set, it returns either a
//! final answer or a batch of tool calls. Everything here is the narrow
//! seam the agent consumes; the wire protocol stays on this side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiProvider;

/// Backend failures
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("unexpected response shape")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One model turn: a final answer, tool calls, or both
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: String,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
        }
    }
}

/// A conversation entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content)
    }

    /// A tool result entry, answering the call with the given id.
    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

/// Assistant-side record of a requested tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDef {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCallDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// A tool offered to the model: name, human-readable description, and a
/// JSON schema for its arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Parameters for one chat call
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDef>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tool_choice: ToolChoice,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// Tool selection mode
#[derive(Debug, Clone)]
pub enum ToolChoice {
    Auto,
    Required(String),
    None,
}

/// The reasoning backend seam
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Build a flat object schema from (name, description, type, required)
/// property rows.
pub fn object_schema(properties: Vec<(String, String, String, bool)>) -> Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, description, prop_type, is_required) in properties {
        props.insert(
            name.clone(),
            serde_json::json!({
                "type": prop_type,
                "description": description
            }),
        );
        if is_required {
            required.push(name);
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_display() {
        assert_eq!(ProviderError::NoApiKey.to_string(), "no api key configured");
        assert_eq!(
            ProviderError::Api("boom".to_string()).to_string(),
            "api error: boom"
        );
        assert_eq!(ProviderError::RateLimited.to_string(), "rate limited");
    }

    #[test]
    fn chat_response_text() {
        let response = ChatResponse::text("done");
        assert_eq!(response.content.as_deref(), Some("done"));
        assert!(!response.has_tool_calls());
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn chat_response_with_calls() {
        let response = ChatResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "increase_temp".to_string(),
                arguments: json!({"degrees": 10}),
            }],
            finish_reason: "tool_calls".to_string(),
        };
        assert!(response.has_tool_calls());
    }

    #[test]
    fn message_roles() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");

        let tool = Message::tool("call_1", "increase_temp", "10");
        assert_eq!(tool.role, "tool");
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool.name.as_deref(), Some("increase_temp"));
        assert_eq!(tool.content.as_deref(), Some("10"));
    }

    #[test]
    fn message_serialization_skips_empty_fields() {
        let json_str = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(json_str.contains("\"role\":\"user\""));
        assert!(!json_str.contains("tool_call_id"));
        assert!(!json_str.contains("\"name\""));
    }

    #[test]
    fn tool_def_shape() {
        let def = ToolDef::new("increase_temp", "Raise the temperature", json!({}));
        assert_eq!(def.tool_type, "function");
        assert_eq!(def.function.name, "increase_temp");

        let json_str = serde_json::to_string(&def).unwrap();
        assert!(json_str.contains("\"type\":\"function\""));
    }

    #[test]
    fn tool_call_def_records_arguments() {
        let def = ToolCallDef::new("call_7", "increase_temp", json!({"degrees": 10}));
        assert_eq!(def.id, "call_7");
        assert_eq!(def.function.arguments, json!({"degrees": 10}));
    }

    #[test]
    fn chat_params_defaults() {
        let params = ChatParams::default();
        assert_eq!(params.max_tokens, 4096);
        assert!(params.tools.is_empty());
        assert!(matches!(params.tool_choice, ToolChoice::Auto));
    }

    #[test]
    fn object_schema_builds_required_list() {
        let schema = object_schema(vec![
            (
                "degrees".to_string(),
                "Degrees to raise by".to_string(),
                "integer".to_string(),
                true,
            ),
            (
                "unit".to_string(),
                "Temperature unit".to_string(),
                "string".to_string(),
                false,
            ),
        ]);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["degrees"]["type"], "integer");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required, &vec![json!("degrees")]);
    }
}
