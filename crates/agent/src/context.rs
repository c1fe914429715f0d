//! Execution context handed to action bodies.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use motive_provider::{Message, Provider};

/// Scoped backend configuration: which model answers, under which system
/// instructions, and how many reasoning iterations a delegation may use.
#[derive(Debug, Clone)]
pub struct ScopeSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_iterations: u32,
}

impl ScopeSettings {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            max_iterations: 8,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }
}

/// The conversation scope currently in force. A delegation swaps in its
/// own scope for the duration of the call and restores the prior one on
/// the way out; no other action may touch it in between.
#[derive(Debug, Clone)]
pub struct PromptScope {
    pub name: String,
    pub messages: Vec<Message>,
}

impl PromptScope {
    pub fn new(name: impl Into<String>, system_prompt: &str) -> Self {
        Self {
            name: name.into(),
            messages: vec![Message::system(system_prompt)],
        }
    }
}

/// Opaque handle passed to each action body: the reasoning backend, the
/// scope configuration, the live prompt scope, and the gate enforcing at
/// most one outstanding delegation per body. Carries no planning state.
pub struct ExecutionContext {
    provider: Arc<dyn Provider>,
    settings: ScopeSettings,
    scope: Mutex<PromptScope>,
    pub(crate) delegation_gate: Mutex<()>,
}

impl ExecutionContext {
    pub fn new(provider: Arc<dyn Provider>, settings: ScopeSettings) -> Self {
        let scope = PromptScope::new("agent", &settings.system_prompt);
        Self {
            provider,
            settings,
            scope: Mutex::new(scope),
            delegation_gate: Mutex::new(()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    pub async fn scope(&self) -> MutexGuard<'_, PromptScope> {
        self.scope.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use motive_provider::{ChatParams, ChatResponse, ProviderError};

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn chat(&self, _params: ChatParams) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::NoApiKey)
        }
        fn default_model(&self) -> String {
            String::new()
        }
        fn is_configured(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn context_starts_in_agent_scope() {
        let settings = ScopeSettings::new("gpt-4o", "You are a helpful barista making coffee.");
        let ctx = ExecutionContext::new(Arc::new(NullProvider), settings);

        let scope = ctx.scope().await;
        assert_eq!(scope.name, "agent");
        assert_eq!(scope.messages.len(), 1);
        assert_eq!(scope.messages[0].role, "system");
    }

    #[test]
    fn settings_builder() {
        let settings = ScopeSettings::new("gpt-4o", "prompt").with_max_iterations(3);
        assert_eq!(settings.max_iterations, 3);
        assert_eq!(settings.model, "gpt-4o");
    }
}
