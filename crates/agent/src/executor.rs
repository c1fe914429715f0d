//! The agent loop: plan, execute, re-plan on divergence.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use motive_planner::{Goal, Planner, WorldState};

use crate::context::ExecutionContext;
use crate::AgentError;

const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Drives plans against the real world until the goal holds.
///
/// One logical control thread: action bodies run to completion, strictly
/// in plan order, before the next entry starts. Before every step the
/// action's precondition is re-checked against the *actual* state — the
/// belief used for planning is advisory only — and any mismatch or body
/// failure discards the remaining plan and re-plans from the real state.
/// The whole run is bounded by an iteration budget and can be cancelled
/// cooperatively between plan entries.
pub struct Executor<'p, S: WorldState> {
    planner: &'p Planner<S, ExecutionContext>,
    goal: Goal<S>,
    context: Arc<ExecutionContext>,
    max_iterations: u32,
    cancel: CancellationToken,
}

impl<'p, S: WorldState> Executor<'p, S> {
    pub fn new(
        planner: &'p Planner<S, ExecutionContext>,
        goal: Goal<S>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            planner,
            goal,
            context,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cancel: CancellationToken::new(),
        }
    }

    /// Budget covering executed actions and re-planning rounds.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the goal holds on the real state. Returns the final
    /// state, or exactly one of `Unreachable`, `MaxIterationsExceeded`,
    /// `Cancelled` — never a partial success.
    pub async fn run(&self, start: S) -> Result<S, AgentError> {
        let mut state = start;
        let mut iterations: u32 = 0;
        let mut rounds: u32 = 0;

        loop {
            if self.goal.is_satisfied(&state) {
                info!(goal = self.goal.name(), "goal satisfied");
                return Ok(state);
            }

            // The first planning round is free; every re-plan counts
            // toward the budget so a divergent world cannot loop forever.
            if rounds > 0 {
                iterations += 1;
                if iterations > self.max_iterations {
                    return Err(AgentError::MaxIterationsExceeded);
                }
            }
            rounds += 1;

            let plan = self
                .planner
                .plan(&state, &self.goal)
                .map_err(|_| AgentError::Unreachable)?;
            info!(
                goal = self.goal.name(),
                steps = plan.len(),
                cost = plan.total_cost(),
                round = rounds,
                "plan ready"
            );

            for action in plan.steps() {
                if self.cancel.is_cancelled() {
                    info!(goal = self.goal.name(), "run cancelled");
                    return Err(AgentError::Cancelled);
                }

                iterations += 1;
                if iterations > self.max_iterations {
                    return Err(AgentError::MaxIterationsExceeded);
                }

                // The real state may have drifted from the projection the
                // planner used; a stale precondition invalidates the rest
                // of this plan.
                if !action.can_run(&state) {
                    warn!(action = action.name(), "precondition no longer holds, re-planning");
                    break;
                }

                debug!(action = action.name(), "executing");
                match action.execute(self.context.clone(), state.clone()).await {
                    Ok(next) => state = next,
                    Err(err) => {
                        warn!(action = action.name(), error = %err, "action failed, re-planning");
                        break;
                    }
                }
            }
        }
    }
}
