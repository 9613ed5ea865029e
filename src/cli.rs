// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the deploy, clean and plugin subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use data_deploy::types::{Multiplier, NodeId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "data-deploy")]
#[command(about = "Distribute datasets to reserved cluster nodes and inflate them in place")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: data-deploy.yml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SSH private key used for every node
    #[arg(long, global = true)]
    pub key_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy local files to every node of a reservation
    Deploy(DeployArgs),

    /// Remove deployed paths from every node of a reservation
    Clean(CleanArgs),

    /// Inspect deployment strategies
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
}

#[derive(Args)]
pub struct DeployArgs {
    /// Local files or directories to deploy
    #[arg(long, required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Destination directory on the nodes (default from config: ~/data)
    #[arg(long)]
    pub dest: Option<String>,

    /// Total number of physical copies per file
    #[arg(long, default_value_t = Multiplier::ONE)]
    pub copy_multiplier: Multiplier,

    /// Total number of names (original plus hard links) per physical copy
    #[arg(long, default_value_t = Multiplier::ONE)]
    pub link_multiplier: Multiplier,

    /// Run remote filesystem commands with sudo
    #[arg(long)]
    pub sudo: bool,

    /// Only print the final result
    #[arg(long)]
    pub silent: bool,

    /// Node that receives the data first, for strategies that use one
    #[arg(long)]
    pub admin: Option<NodeId>,

    /// Re-run a failed deployment this many times (default from config: 0)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Reservation file (default: config file, then stdin)
    #[arg(long)]
    pub reservation: Option<PathBuf>,

    /// Strategy to deploy with
    pub plugin: String,

    /// Arguments passed to the strategy
    #[arg(last = true)]
    pub plugin_args: Vec<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Remote paths to remove (default: the configured destination)
    #[arg(long, num_args = 0..)]
    pub paths: Option<Vec<String>>,

    /// Run remote commands with sudo
    #[arg(long)]
    pub sudo: bool,

    /// Only print the final result
    #[arg(long)]
    pub silent: bool,

    /// Reservation file (default: config file, then stdin)
    #[arg(long)]
    pub reservation: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum PluginCommand {
    /// List built-in and external strategies
    List,
}
