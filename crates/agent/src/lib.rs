//! Plan execution and delegation.
//!
//! Drives a plan produced by `motive-planner` against the real world:
//! preconditions are re-checked against actual state before every step,
//! and any divergence between an action's belief and its real effect is
//! recovered by re-planning. Action bodies may hand off bounded subtasks
//! to the reasoning backend through the dispatcher.

use thiserror::Error;

pub mod context;
pub mod dispatcher;
pub mod executor;
pub mod tools;

pub use context::{ExecutionContext, PromptScope, ScopeSettings};
pub use dispatcher::{delegate, DelegationError};
pub use executor::Executor;
pub use tools::{ToolError, ToolRegistry, ToolSpec};

/// Terminal outcomes of a run. Execution-time trouble (a failed body, a
/// stale precondition) is recovered internally by re-planning; only these
/// reach the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("no action sequence reaches the goal")]
    Unreachable,

    #[error("iteration budget exhausted before the goal was reached")]
    MaxIterationsExceeded,

    #[error("run cancelled")]
    Cancelled,
}
