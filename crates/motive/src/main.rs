//! motive - a goal-oriented action planning agent

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;
mod demo;

use commands::{demo_command, init_command};

/// motive - plan a sequence of actions toward a goal, then make it real
#[derive(Parser)]
#[command(name = "motive")]
#[command(about = "A goal-oriented action planning agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config to ~/.motive/config.json
    Init,
    /// Run the barista demo
    Demo {
        /// Delegate the brew step to the reasoning backend
        #[arg(long)]
        delegate: bool,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Demo { verbose: true, .. }) {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Demo { delegate, .. } => {
            if let Err(e) = demo_command(delegate).await {
                error!("Demo failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
