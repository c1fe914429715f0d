//! Best-first search over the projected state graph.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, trace};

use crate::{Action, Goal, PlanError, WorldState};

const DEFAULT_MAX_EXPANSIONS: usize = 10_000;

type Heuristic<S> = Box<dyn Fn(&S) -> f64 + Send + Sync>;

/// An ordered, costed sequence of actions. Borrows the actions from the
/// planner's library; immutable once returned, consumed front to back.
#[derive(Debug)]
pub struct Plan<'a, S, C> {
    steps: Vec<&'a Action<S, C>>,
    total_cost: f64,
}

impl<'a, S: WorldState, C> Plan<'a, S, C> {
    pub fn steps(&self) -> &[&'a Action<S, C>] {
        &self.steps
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Action names in execution order, for logs and assertions.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|a| a.name()).collect()
    }
}

/// A frontier entry. `seq` is the insertion counter: equal priorities pop
/// in insertion order, which keeps plans deterministic across runs.
struct Node<S> {
    state: S,
    path_cost: f64,
    actions: Vec<usize>,
    priority: f64,
    seq: u64,
}

impl<S> PartialEq for Node<S> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<S> Eq for Node<S> {}

impl<S> PartialOrd for Node<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Node<S> {
    // Reversed: BinaryHeap is a max-heap, we want the lowest priority
    // (then lowest seq) on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Searches the projected state graph for a minimum-cost plan.
///
/// Runs A* with a zero heuristic by default, which degrades to
/// uniform-cost search and guarantees a minimum-cost plan. A supplied
/// heuristic must be admissible (never overestimate the remaining cost)
/// for that guarantee to hold; admissibility is the caller's
/// responsibility and is not checked here.
pub struct Planner<S, C> {
    actions: Vec<Action<S, C>>,
    heuristic: Option<Heuristic<S>>,
    max_expansions: usize,
}

impl<S: WorldState, C> Planner<S, C> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            heuristic: None,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    /// Register an action into the library. The library is immutable once
    /// planning begins. Rejects negative costs, which would break the
    /// search's well-foundedness.
    pub fn register(&mut self, action: Action<S, C>) -> Result<(), PlanError> {
        if action.cost() < 0.0 {
            return Err(PlanError::NegativeCost(action.name().to_string()));
        }
        self.actions.push(action);
        Ok(())
    }

    /// Supply a domain heuristic. Must be admissible for optimality.
    pub fn with_heuristic(mut self, h: impl Fn(&S) -> f64 + Send + Sync + 'static) -> Self {
        self.heuristic = Some(Box::new(h));
        self
    }

    /// Cap the number of node expansions before the search gives up
    /// with `Unreachable`.
    pub fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = max;
        self
    }

    pub fn actions(&self) -> &[Action<S, C>] {
        &self.actions
    }

    fn estimate(&self, state: &S) -> f64 {
        self.heuristic.as_ref().map_or(0.0, |h| h(state))
    }

    /// Find a minimum-cost action sequence from `start` to a state
    /// satisfying `goal`. Fails with `Unreachable` when the frontier
    /// empties or the expansion budget runs out.
    pub fn plan<'a>(&'a self, start: &S, goal: &Goal<S>) -> Result<Plan<'a, S, C>, PlanError> {
        let mut frontier: BinaryHeap<Node<S>> = BinaryHeap::new();
        // Best known path cost per visited state. A state reached again
        // with an equal-or-worse cost is pruned; strictly better re-opens.
        let mut best_cost: HashMap<S, f64> = HashMap::new();
        let mut seq: u64 = 0;
        let mut expansions: usize = 0;

        frontier.push(Node {
            state: start.clone(),
            path_cost: 0.0,
            actions: Vec::new(),
            priority: self.estimate(start),
            seq,
        });

        while let Some(node) = frontier.pop() {
            if goal.is_satisfied(&node.state) {
                debug!(
                    goal = goal.name(),
                    steps = node.actions.len(),
                    cost = node.path_cost,
                    expansions,
                    "plan found"
                );
                return Ok(Plan {
                    steps: node.actions.iter().map(|&i| &self.actions[i]).collect(),
                    total_cost: node.path_cost,
                });
            }

            match best_cost.get(&node.state) {
                Some(&known) if known <= node.path_cost => continue,
                _ => {
                    best_cost.insert(node.state.clone(), node.path_cost);
                }
            }

            expansions += 1;
            if expansions > self.max_expansions {
                debug!(goal = goal.name(), expansions, "expansion budget exceeded");
                return Err(PlanError::Unreachable);
            }

            for (index, action) in self.actions.iter().enumerate() {
                if !action.can_run(&node.state) {
                    continue;
                }

                let next = action.project(&node.state);
                let next_cost = node.path_cost + action.cost();
                if let Some(&known) = best_cost.get(&next) {
                    if known <= next_cost {
                        continue;
                    }
                }

                trace!(action = action.name(), cost = next_cost, "expanding");
                seq += 1;
                let mut actions = node.actions.clone();
                actions.push(index);
                frontier.push(Node {
                    priority: next_cost + self.estimate(&next),
                    state: next,
                    path_cost: next_cost,
                    actions,
                    seq,
                });
            }
        }

        debug!(goal = goal.name(), expansions, "frontier exhausted");
        Err(PlanError::Unreachable)
    }
}

impl<S: WorldState, C> Default for Planner<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
