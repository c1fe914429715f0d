//! Goal-oriented action planning over a typed world state.
//!
//! The planner searches the *projected* state graph: each action declares a
//! belief about its effect, and the search composes beliefs to find a
//! minimum-cost sequence reaching the goal. Real execution lives elsewhere
//! and is allowed to diverge from belief; callers re-validate preconditions
//! against real state before each step.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

mod search;

pub use search::{Plan, Planner};

/// Planning failures
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("no action sequence reaches the goal within the search budget")]
    Unreachable,

    #[error("action '{0}' has a negative cost")]
    NegativeCost(String),
}

/// Failure of an action's real execution. Carries a message only; the
/// executor recovers by re-planning, it never inspects the cause.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// World state the planner can search over. Structural equality and
/// hashing key the closed list; cloning produces the successor snapshots.
///
/// Blanket-implemented for any type with the right bounds.
pub trait WorldState:
    Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}

impl<T> WorldState for T where
    T: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}

type Precondition<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;
type Belief<S> = Box<dyn Fn(&S) -> S + Send + Sync>;
type CostFn = Box<dyn Fn() -> f64 + Send + Sync>;

/// Future returned by an action body.
pub type BodyFuture<S> = Pin<Box<dyn Future<Output = Result<S, ActionError>> + Send>>;

type ActionBody<S, C> = Box<dyn Fn(Arc<C>, S) -> BodyFuture<S> + Send + Sync>;

/// A named unit of work: a precondition gating when it may run, a pure
/// belief projection used only for search, a non-negative cost, and an
/// optional async body performing the real effect.
///
/// `precondition`, `belief` and `cost` must be pure functions of the state
/// alone; capture any domain constants explicitly at construction time.
/// When no body is attached, executing the action applies the belief.
pub struct Action<S, C> {
    name: String,
    precondition: Precondition<S>,
    belief: Belief<S>,
    cost: CostFn,
    body: Option<ActionBody<S, C>>,
}

impl<S: WorldState, C> Action<S, C> {
    pub fn new(
        name: impl Into<String>,
        precondition: impl Fn(&S) -> bool + Send + Sync + 'static,
        belief: impl Fn(&S) -> S + Send + Sync + 'static,
        cost: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            precondition: Box::new(precondition),
            belief: Box::new(belief),
            cost: Box::new(cost),
            body: None,
        }
    }

    /// Attach the real execution body. The body receives the execution
    /// context and the actual current state, and returns the real
    /// resulting state, which may differ from the belief projection.
    pub fn with_body<F, Fut>(mut self, body: F) -> Self
    where
        F: Fn(Arc<C>, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, ActionError>> + Send + 'static,
    {
        self.body = Some(Box::new(move |ctx, state| Box::pin(body(ctx, state))));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the action may be planned or executed in `state`.
    pub fn can_run(&self, state: &S) -> bool {
        (self.precondition)(state)
    }

    /// Projected successor state. Search-only; never a real effect.
    pub fn project(&self, state: &S) -> S {
        (self.belief)(state)
    }

    pub fn cost(&self) -> f64 {
        (self.cost)()
    }

    /// Run the real effect. Falls back to the belief projection when no
    /// body was attached.
    pub async fn execute(&self, ctx: Arc<C>, state: S) -> Result<S, ActionError> {
        match &self.body {
            Some(body) => body(ctx, state).await,
            None => Ok((self.belief)(&state)),
        }
    }
}

impl<S, C> std::fmt::Debug for Action<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

/// A named goal condition over the world state. One goal is active per
/// planning episode.
pub struct Goal<S> {
    name: String,
    description: String,
    condition: Box<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S: WorldState> Goal<S> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        condition: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            condition: Box::new(condition),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_satisfied(&self, state: &S) -> bool {
        (self.condition)(state)
    }
}

impl<S> std::fmt::Debug for Goal<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Goal")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Counter(u32);

    #[test]
    fn action_projects_without_side_effects() {
        let action: Action<Counter, ()> =
            Action::new("inc", |s: &Counter| s.0 < 3, |s| Counter(s.0 + 1), || 1.0);

        let start = Counter(0);
        assert_eq!(action.project(&start), Counter(1));
        assert_eq!(start, Counter(0));
        assert!(action.can_run(&start));
        assert!(!action.can_run(&Counter(3)));
    }

    #[tokio::test]
    async fn action_without_body_applies_belief() {
        let action: Action<Counter, ()> =
            Action::new("inc", |_: &Counter| true, |s| Counter(s.0 + 1), || 1.0);

        let result = action.execute(Arc::new(()), Counter(5)).await.unwrap();
        assert_eq!(result, Counter(6));
    }

    #[tokio::test]
    async fn action_body_may_diverge_from_belief() {
        let action: Action<Counter, ()> =
            Action::new("inc", |_: &Counter| true, |s| Counter(s.0 + 1), || 1.0)
                .with_body(|_ctx, s: Counter| async move { Ok(Counter(s.0 + 7)) });

        assert_eq!(action.project(&Counter(0)), Counter(1));
        let real = action.execute(Arc::new(()), Counter(0)).await.unwrap();
        assert_eq!(real, Counter(7));
    }

    #[test]
    fn goal_condition() {
        let goal: Goal<Counter> = Goal::new("done", "counter reached three", |s: &Counter| s.0 >= 3);
        assert!(!goal.is_satisfied(&Counter(2)));
        assert!(goal.is_satisfied(&Counter(3)));
        assert_eq!(goal.name(), "done");
        assert_eq!(goal.description(), "counter reached three");
    }
}
