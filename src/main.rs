// ABOUTME: Entry point for the data-deploy CLI application.
// ABOUTME: Parses arguments, sets up logging and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, PluginCommand};
use commands::Context;
use data_deploy::config::Config;
use data_deploy::error::Result;
use data_deploy::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    if let Err(e) = run(cli).await {
        Output::new(OutputMode::select(json, false)).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = Config::load_or_default(cli.config.as_deref(), &cwd)?;
    let ctx = Context::new(config, cli.key_path);

    match cli.command {
        Commands::Deploy(args) => {
            let output = Output::new(OutputMode::select(cli.json, args.silent));
            commands::deploy(args, &ctx, output).await
        }
        Commands::Clean(args) => {
            let output = Output::new(OutputMode::select(cli.json, args.silent));
            commands::clean(args, &ctx, output).await
        }
        Commands::Plugin {
            command: PluginCommand::List,
        } => {
            let output = Output::new(OutputMode::select(cli.json, false));
            commands::list_plugins(&ctx.registry(), &output).await
        }
    }
}
