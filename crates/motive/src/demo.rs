//! The barista world: a small action library for making coffee.
//!
//! With delegation enabled, the brew step hands temperature control to
//! the reasoning backend through an `increase_temp` tool. The planner
//! still projects the fixed `BREW_INCREMENT`; the real increment comes
//! from the tool result, so the two may diverge and the executor's
//! re-planning covers the gap.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use motive_agent::{delegate, ExecutionContext, ToolError, ToolRegistry, ToolSpec};
use motive_planner::{Action, ActionError, Goal, PlanError, Planner};
use motive_provider::object_schema;

pub const REQUIRED_BEANS: u32 = 5;
pub const REQUIRED_BREW_TEMP: i32 = 150;
pub const BREW_INCREMENT: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoffeeState {
    pub beans: u32,
    pub has_water: bool,
    pub brew_temp: i32,
    pub has_milk: bool,
    pub is_ready: bool,
}

impl Default for CoffeeState {
    fn default() -> Self {
        Self {
            beans: 0,
            has_water: false,
            brew_temp: 100,
            has_milk: false,
            is_ready: false,
        }
    }
}

/// Service tool offered to the backend during the brew delegation.
pub struct IncreaseTempTool;

#[derive(Deserialize)]
struct IncreaseTempArgs {
    degrees: i32,
}

#[async_trait]
impl ToolSpec for IncreaseTempTool {
    fn name(&self) -> &str {
        "increase_temp"
    }

    fn description(&self) -> &str {
        "Increase the brew temperature by the given number of degrees"
    }

    fn schema(&self) -> Value {
        object_schema(vec![(
            "degrees".to_string(),
            "Number of degrees to increase the temperature by".to_string(),
            "integer".to_string(),
            true,
        )])
    }

    async fn invoke(&self, args: Value) -> Result<String, ToolError> {
        let args: IncreaseTempArgs = serde_json::from_value(args)?;
        println!("Increasing temperature by {} degrees...", args.degrees);
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(args.degrees.to_string())
    }
}

pub fn coffee_goal() -> Goal<CoffeeState> {
    Goal::new("Coffee ready", "Coffee is ready to drink", |s: &CoffeeState| {
        s.is_ready
    })
}

/// Build the coffee action library. With `delegate_brew` the brew body
/// asks the backend to turn the temperature up; otherwise it applies the
/// fixed increment itself.
pub fn coffee_planner(
    delegate_brew: bool,
) -> Result<Planner<CoffeeState, ExecutionContext>, PlanError> {
    let mut planner = Planner::new();

    planner.register(
        Action::new(
            "Get coffee beans",
            |s: &CoffeeState| s.beans < REQUIRED_BEANS,
            |s: &CoffeeState| CoffeeState { beans: s.beans + 1, ..s.clone() },
            || 1.0,
        )
        .with_body(|_ctx, s: CoffeeState| async move {
            println!(
                "Getting coffee beans from the pantry... Number of beans: {}",
                s.beans
            );
            Ok(CoffeeState { beans: s.beans + 1, ..s })
        }),
    )?;

    planner.register(
        Action::new(
            "Add water",
            |s: &CoffeeState| !s.has_water,
            |s: &CoffeeState| CoffeeState { has_water: true, ..s.clone() },
            || 1.0,
        )
        .with_body(|_ctx, s: CoffeeState| async move {
            println!("Adding fresh water to the coffee maker...");
            Ok(CoffeeState { has_water: true, ..s })
        }),
    )?;

    let brew = Action::new(
        "Brew coffee",
        |s: &CoffeeState| {
            s.beans >= REQUIRED_BEANS && s.has_water && s.brew_temp < REQUIRED_BREW_TEMP
        },
        |s: &CoffeeState| CoffeeState { brew_temp: s.brew_temp + BREW_INCREMENT, ..s.clone() },
        || 2.0,
    );
    let brew = if delegate_brew {
        let mut tools = ToolRegistry::new();
        tools.register(IncreaseTempTool);
        let tools = Arc::new(tools);

        brew.with_body(move |ctx: Arc<ExecutionContext>, s: CoffeeState| {
            let tools = tools.clone();
            async move {
                println!(
                    "Brewing coffee... (this takes a moment) Coffee temperature: {}",
                    s.brew_temp
                );
                let instruction =
                    format!("Turn up the temperature by {} degrees", BREW_INCREMENT);
                let answer = delegate(&ctx, &instruction, &tools).await?;
                let degrees: i32 = answer.trim().parse().map_err(|_| {
                    ActionError::new(format!("backend returned a non-numeric result: {answer}"))
                })?;
                Ok(CoffeeState { brew_temp: s.brew_temp + degrees, ..s })
            }
        })
    } else {
        brew.with_body(|_ctx, s: CoffeeState| async move {
            println!(
                "Brewing coffee... (this takes a moment) Coffee temperature: {}",
                s.brew_temp
            );
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(CoffeeState { brew_temp: s.brew_temp + BREW_INCREMENT, ..s })
        })
    };
    planner.register(brew)?;

    planner.register(
        Action::new(
            "Add milk",
            |s: &CoffeeState| s.brew_temp >= REQUIRED_BREW_TEMP && !s.has_milk,
            |s: &CoffeeState| CoffeeState { has_milk: true, is_ready: true, ..s.clone() },
            || 1.0,
        )
        .with_body(|_ctx, s: CoffeeState| async move {
            println!("Adding milk to coffee...");
            Ok(CoffeeState { has_milk: true, is_ready: true, ..s })
        }),
    )?;

    planner.register(
        Action::new(
            "Serve black coffee",
            |s: &CoffeeState| s.brew_temp >= REQUIRED_BREW_TEMP && !s.is_ready,
            |s: &CoffeeState| CoffeeState { is_ready: true, ..s.clone() },
            || 0.5,
        )
        .with_body(|_ctx, s: CoffeeState| async move {
            println!("Serving coffee black (no milk)...");
            Ok(CoffeeState { is_ready: true, ..s })
        }),
    )?;

    Ok(planner)
}
