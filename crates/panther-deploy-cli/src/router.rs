// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{Command, DeployCommand};
use crate::error::CliResult;

/// Deploys the Panther stacks to an AWS account
#[derive(Parser, Debug)]
#[command(name = "panther-deploy")]
#[command(bin_name = "panther-deploy")]
#[command(about = "Deploy Panther to an AWS account")]
#[command(
    long_about = "Deploys every Panther stack in dependency order, or a single stack when\n--stack (or the STACK environment variable) names one.\n\nSet CUSTOM_RESOURCE_VERSION to force every custom resource to update."
)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file (default: panther_config.yml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// AWS region (default: AWS_REGION or the aws profile)
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Deploy Panther
    #[command(about = "Deploy all stacks, or one stack with --stack")]
    Deploy {
        /// Redeploy only this stack, e.g. core or panther-web
        #[arg(short, long, value_name = "STACK")]
        stack: Option<String>,

        /// Build output directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}

/// Routes parsed arguments to command handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Build the handler for the parsed command line
    pub fn command(cli: &Cli) -> DeployCommand {
        // `deploy` is the only command, so it is also the default
        let command = cli.command.clone().unwrap_or(Commands::Deploy {
            stack: None,
            out_dir: None,
        });

        match command {
            Commands::Deploy { stack, out_dir } => DeployCommand::new()
                .with_stack(stack)
                .with_region(cli.region.clone())
                .with_config(cli.config.clone())
                .with_out_dir(out_dir),
        }
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        Self::command(cli).execute().await
    }
}
