//! Subtask dispatcher: bounded hand-off of work to the reasoning backend.
//!
//! An action body calls [`delegate`] with an instruction and a restricted
//! tool set, suspends until the backend produces a single final answer,
//! and resumes with it. The backend owns the reasoning; this side owns
//! argument validation, tool invocation, the iteration budget, and the
//! scope swap-and-restore.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use motive_planner::ActionError;
use motive_provider::{ChatParams, Message, ToolCallDef, ToolChoice};

use crate::context::{ExecutionContext, PromptScope};
use crate::tools::ToolRegistry;

const SUBTASK_PROMPT: &str = "You are completing a bounded subtask on behalf of a running action. \
    Use the available tools to carry out the instruction, then reply with the final result and \
    nothing else.";

/// Delegation failures. The owning action treats these as ordinary action
/// failure; the executor recovers by re-planning.
#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("delegation budget exhausted after {0} iterations")]
    BudgetExhausted(u32),

    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("provider: {0}")]
    Provider(String),

    #[error("a delegation is already outstanding for this action")]
    Busy,
}

impl From<DelegationError> for ActionError {
    fn from(err: DelegationError) -> Self {
        ActionError::new(err.to_string())
    }
}

/// Hand `instruction` to the backend with `tools` as the only callable
/// surface, and block until it answers or runs out of budget.
///
/// At most one delegation may be outstanding per action body. The prompt
/// scope is swapped to the subtask's for the duration of the call and
/// restored on both exit paths.
pub async fn delegate(
    ctx: &ExecutionContext,
    instruction: &str,
    tools: &ToolRegistry,
) -> Result<String, DelegationError> {
    let _gate = ctx
        .delegation_gate
        .try_lock()
        .map_err(|_| DelegationError::Busy)?;

    debug!(instruction, tools = ?tools.names(), "delegating subtask");

    let prior = {
        let mut scope = ctx.scope().await;
        let mut subtask = PromptScope::new("subtask", SUBTASK_PROMPT);
        subtask.messages.push(Message::user(instruction));
        std::mem::replace(&mut *scope, subtask)
    };

    let result = run_tool_loop(ctx, tools).await;

    {
        let mut scope = ctx.scope().await;
        *scope = prior;
    }

    match &result {
        Ok(answer) => debug!(answer, "delegation finished"),
        Err(err) => warn!(error = %err, "delegation failed"),
    }
    result
}

/// The exchange with the backend: offer the tools, execute what it calls,
/// feed results back, stop at its first tool-free reply.
async fn run_tool_loop(
    ctx: &ExecutionContext,
    tools: &ToolRegistry,
) -> Result<String, DelegationError> {
    let definitions = tools.definitions();
    let budget = ctx.settings().max_iterations;

    for _ in 0..budget {
        let params = ChatParams {
            model: ctx.settings().model.clone(),
            messages: ctx.scope().await.messages.clone(),
            tools: definitions.clone(),
            tool_choice: ToolChoice::Auto,
            ..Default::default()
        };

        let response = ctx
            .provider()
            .chat(params)
            .await
            .map_err(|e| DelegationError::Provider(e.to_string()))?;

        if !response.has_tool_calls() {
            return Ok(response.content.unwrap_or_default());
        }

        {
            let mut scope = ctx.scope().await;
            let mut msg = Message::assistant(response.content.clone().unwrap_or_default());
            msg.tool_calls = Some(
                response
                    .tool_calls
                    .iter()
                    .map(|tc| ToolCallDef::new(&tc.id, &tc.name, tc.arguments.clone()))
                    .collect(),
            );
            scope.messages.push(msg);
        }

        for call in &response.tool_calls {
            let spec = tools.get(&call.name).ok_or_else(|| DelegationError::Tool {
                tool: call.name.clone(),
                message: "unknown tool".to_string(),
            })?;

            validate_arguments(&call.name, &spec.schema(), &call.arguments)?;

            debug!(tool = %call.name, args = %call.arguments, "invoking tool");
            let output =
                spec.invoke(call.arguments.clone())
                    .await
                    .map_err(|e| DelegationError::Tool {
                        tool: call.name.clone(),
                        message: e.to_string(),
                    })?;

            ctx.scope()
                .await
                .messages
                .push(Message::tool(&call.id, &call.name, output));
        }
    }

    Err(DelegationError::BudgetExhausted(budget))
}

/// Structural check of `args` against the tool's object schema: required
/// properties must be present and declared primitive types must match.
/// Tools still deserialize their own arguments; this catches backend
/// mistakes before any tool code runs.
fn validate_arguments(tool: &str, schema: &Value, args: &Value) -> Result<(), DelegationError> {
    let invalid = |reason: String| DelegationError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };

    let Some(object) = args.as_object() else {
        return Err(invalid("arguments are not an object".to_string()));
    };

    if let Some(required) = schema["required"].as_array() {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !object.contains_key(field) {
                return Err(invalid(format!("missing required field '{}'", field)));
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (field, value) in object {
            let Some(expected) = properties.get(field).and_then(|p| p["type"].as_str()) else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !matches {
                return Err(invalid(format!(
                    "field '{}' should be of type {}",
                    field, expected
                )));
            }
        }
    }

    Ok(())
}
