mod args;
mod cmd_branch;
mod cmd_build;
mod cmd_ci;
mod cmd_completion;
mod cmd_config;
mod cmd_graphql;
mod cmd_project;
mod cmd_promote;
mod cmd_promotion_level;
mod cmd_validate;
mod cmd_validation_stamp;
mod cmd_version;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use yontrack_client::Client;
use yontrack_config::ConfigStore;

#[derive(Parser, Debug)]
#[command(name = "yontrack")]
#[command(version, about = "Command line client for Ontrack / Yontrack")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file, instead of ~/.yontrack-config.yaml
    #[arg(long, global = true, env = "YONTRACK_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Logs every GraphQL request and response
    #[arg(long, global = true)]
    graphql_log: bool,

    /// Logs what the commands do
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the connections to Ontrack
    Config {
        #[command(subcommand)]
        op: cmd_config::ConfigOp,
    },
    /// Display the versions of the CLI and of the server
    Version(cmd_version::VersionArgs),
    /// Run a raw GraphQL query
    #[command(name = "graphql")]
    GraphQL(cmd_graphql::GraphQLArgs),
    /// Manage projects
    Project {
        #[command(subcommand)]
        op: cmd_project::ProjectOp,
    },
    /// Manage branches
    Branch {
        #[command(subcommand)]
        op: cmd_branch::BranchOp,
    },
    /// Manage builds
    Build {
        #[command(subcommand)]
        op: cmd_build::BuildOp,
    },
    /// Manage validation stamps
    #[command(name = "validation-stamp", visible_aliases = ["validation", "vs"])]
    ValidationStamp {
        #[command(subcommand)]
        op: cmd_validation_stamp::ValidationStampOp,
    },
    /// Validate a build
    Validate(cmd_validate::ValidateArgs),
    /// Promote a build
    Promote(cmd_promote::PromoteArgs),
    /// Manage promotion levels
    #[command(name = "promotion-level", visible_aliases = ["promotion", "pl"])]
    PromotionLevel {
        #[command(subcommand)]
        op: cmd_promotion_level::PromotionLevelOp,
    },
    /// Integration with CI engines
    Ci {
        #[command(subcommand)]
        op: cmd_ci::CiOp,
    },
    /// Generate shell completions
    Completion(cmd_completion::CompletionArgs),
}

/// State shared by all commands.
pub struct App {
    store: ConfigStore,
}

impl App {
    fn new(config_file: Option<PathBuf>) -> Result<Self> {
        let store = match config_file {
            Some(path) => ConfigStore::with_path(path),
            None => ConfigStore::new()?,
        };
        Ok(Self { store })
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Client for the selected configuration.
    pub fn client(&self) -> Result<Client> {
        let config = self
            .store
            .selected()
            .with_context(|| format!("Cannot load {}", self.store.path().display()))?;
        tracing::info!(config = %config.name, url = %config.url, "using configuration");
        Ok(Client::new(config)?)
    }
}

fn init_tracing(cli: &Cli) {
    let mut directives = String::from(if cli.verbose { "warn,yontrack=info" } else { "warn" });
    if cli.graphql_log {
        directives.push_str(",yontrack_client=debug");
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let app = App::new(cli.config_file)?;
    match cli.command {
        Commands::Config { op } => cmd_config::run(&app, op),
        Commands::Version(args) => cmd_version::run(&app, args),
        Commands::GraphQL(args) => cmd_graphql::run(&app, args),
        Commands::Project { op } => cmd_project::run(&app, op),
        Commands::Branch { op } => cmd_branch::run(&app, op),
        Commands::Build { op } => cmd_build::run(&app, op),
        Commands::ValidationStamp { op } => cmd_validation_stamp::run(&app, op),
        Commands::Validate(args) => cmd_validate::run(&app, args),
        Commands::Promote(args) => cmd_promote::run(&app, args),
        Commands::PromotionLevel { op } => cmd_promotion_level::run(&app, op),
        Commands::Ci { op } => cmd_ci::run(&app, op),
        Commands::Completion(args) => {
            cmd_completion::run(&args);
            Ok(())
        }
    }
}
