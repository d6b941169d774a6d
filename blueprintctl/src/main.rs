//! blueprintctl
//!
//! Provision tenant bootstrap manifests into a GitOps repository

mod commands;
mod output;

use blueprintctl::config::Config;
use blueprintctl::logging::LoggingConfig;
use clap::{Parser, Subcommand};
use commands::Context;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path of the platform GitOps repository
    #[arg(long, global = true)]
    repo_path: Option<PathBuf>,

    /// Commit and push changes after writing them
    #[arg(long, global = true)]
    push: bool,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        command: TenantCommands,
    },
    /// Inspect the plan catalog
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum TenantCommands {
    /// Render bootstrap manifests for a new tenant
    Create {
        /// Tenant name (lowercase DNS label)
        #[arg(short, long)]
        name: String,
        /// Resource plan
        #[arg(short, long, default_value = "starter")]
        plan: String,
        /// Git repository holding the tenant's application manifests
        #[arg(short, long)]
        repo: String,
        /// Public domain for the tenant ingress
        #[arg(short, long)]
        domain: String,
        /// Contact email
        #[arg(short, long)]
        email: String,
        /// Show what would be written without touching the repository
        #[arg(long)]
        dry_run: bool,
    },
    /// List provisioned tenants
    List,
    /// Remove a tenant directory
    Delete {
        /// Tenant name
        #[arg(short, long)]
        name: String,
        /// Confirm the deletion
        #[arg(short, long)]
        force: bool,
    },
    /// Re-render a tenant from its tenant.yaml
    Sync {
        /// Tenant name
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// List available plans
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let logging = LoggingConfig {
        level: config.log_level.clone(),
        file_dir: config.log_dir.clone(),
        ..LoggingConfig::default()
    }
    .with_env();
    let _guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            output::print_error(&format!("failed to initialize logging: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let ctx = Context {
        repo_root: cli.repo_path.unwrap_or_else(|| config.repo_path.clone()),
        format: OutputFormat::from_name(cli.output.as_deref().unwrap_or(&config.output)),
        auto_push: cli.push || config.auto_push,
        remote: config.remote.clone(),
        author: config.author(),
    };

    match cli.command {
        Commands::Tenant { command } => commands::tenant::handle_tenant_command(command, &ctx)?,
        Commands::Plan { command } => commands::plan::handle_plan_command(command, &ctx)?,
        Commands::Completions { shell } => generate_completions(shell),
    }

    Ok(())
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
