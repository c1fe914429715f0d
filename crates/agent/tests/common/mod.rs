//! Shared fixtures: a scripted reasoning backend and context helpers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use motive_agent::{ExecutionContext, ScopeSettings};
use motive_provider::{ChatParams, ChatResponse, Provider, ProviderError, ToolCall};
use serde_json::Value;

/// Backend that replays a fixed script of responses, then falls back to
/// an optional repeating response. An empty script with no fallback is a
/// test bug and surfaces as an api error.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ChatResponse, ProviderError>>>,
    repeat: Option<ChatResponse>,
    delay: Option<Duration>,
    pub params_seen: Mutex<Vec<ChatParams>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ChatResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            repeat: None,
            delay: None,
            params_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: ChatResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            delay: None,
            params_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.params_seen.lock().unwrap().push(params);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => match &self.repeat {
                Some(response) => Ok(response.clone()),
                None => Err(ProviderError::Api("script exhausted".to_string())),
            },
        }
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub fn tool_call_response(id: &str, name: &str, arguments: Value) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
    }
}

pub fn context_with(provider: Arc<dyn Provider>) -> Arc<ExecutionContext> {
    let settings =
        ScopeSettings::new("test-model", "You are a test agent.").with_max_iterations(4);
    Arc::new(ExecutionContext::new(provider, settings))
}

/// Context whose backend answers nothing; for runs that never delegate.
pub fn inert_context() -> Arc<ExecutionContext> {
    context_with(Arc::new(ScriptedProvider::new(Vec::new())))
}
