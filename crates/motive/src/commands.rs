//! CLI command implementations.

use std::sync::Arc;

use anyhow::{bail, Context};

use motive_agent::{ExecutionContext, Executor, ScopeSettings};
use motive_config::{config_path, Config};
use motive_provider::{OpenAiProvider, Provider};

use crate::demo::{self, CoffeeState};

pub async fn init_command() -> anyhow::Result<()> {
    let created = Config::init().await.context("writing default config")?;
    let path = config_path();
    if created {
        println!("Wrote default config to {}", path.display());
        println!("Set provider.api_key to enable delegation.");
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}

pub async fn demo_command(delegate: bool) -> anyhow::Result<()> {
    let config = Config::load().await.context("loading config")?;

    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(
        config.provider.api_key.clone(),
        config.provider.api_base.clone(),
        Some(config.provider.model.clone()),
    ));
    if delegate && !provider.is_configured() {
        bail!(
            "delegation needs an api key; run `motive init` and set provider.api_key in {}",
            config_path().display()
        );
    }

    let settings = ScopeSettings::new(
        config.provider.model.clone(),
        "You are a helpful barista making coffee.",
    )
    .with_max_iterations(config.agent.delegation_max_iterations);
    let context = Arc::new(ExecutionContext::new(provider, settings));

    let planner =
        demo::coffee_planner(delegate)?.with_max_expansions(config.agent.max_expansions);
    let executor = Executor::new(&planner, demo::coffee_goal(), context)
        .with_max_iterations(config.agent.max_iterations);

    println!("Starting to make coffee...");
    let final_state = executor.run(CoffeeState::default()).await?;

    println!("\nFinal state: {:?}", final_state);
    println!("Coffee is ready!");
    Ok(())
}
