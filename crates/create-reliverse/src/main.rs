//! create-reliverse - Project scaffolding for Reliverse web apps

use anyhow::Result;
use clap::{Parser, Subcommand};
use reliverse_core::{Command, DepsBehavior, ProductConfig, RunArgs};
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reliverse product configuration
#[derive(Clone)]
pub struct ReliverseProduct;

impl ProductConfig for ReliverseProduct {
    fn name(&self) -> &'static str {
        "create-reliverse"
    }

    fn display_name(&self) -> &'static str {
        "Reliverse"
    }

    fn cli_description(&self) -> &'static str {
        "Create and manage web projects from Reliverse templates"
    }

    fn docs_url(&self) -> &'static str {
        "https://docs.reliverse.org"
    }

    fn default_env_example_url(&self) -> &'static str {
        "https://raw.githubusercontent.com/blefnk/relivator/main/.env.example"
    }
}

#[derive(Parser, Debug)]
#[command(name = "create-reliverse")]
#[command(about = "Create and manage web projects from Reliverse templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Never prompt; use configured defaults and automatic decisions
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Create projects under tests-runtime/ (for development use)
    #[arg(long, global = true)]
    pub dev: bool,

    /// How to handle dependency installation
    #[arg(long, value_enum, global = true)]
    pub deps: Option<DepsBehavior>,

    /// Print debug diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    /// Template to use, as <author>/<name>
    #[arg(short, long, global = true)]
    pub template: Option<String>,

    /// Project name
    #[arg(short, long, global = true)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CliCommand {
    /// Create a new project from a template
    Create,
    /// Manage a project in the current directory
    Manage,
    /// List available templates and their cache status
    Templates,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Create => Command::Create,
            CliCommand::Manage => Command::Manage,
            CliCommand::Templates => Command::Templates,
        }
    }
}

impl From<Args> for RunArgs {
    fn from(args: Args) -> Self {
        RunArgs {
            command: args.command.map(Into::into),
            yes: args.yes,
            dev: args.dev,
            deps: args.deps,
            template: args.template,
            name: args.name,
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_tracing(args.debug);

    let config = ReliverseProduct;
    let result = reliverse_core::run(&config, args.into(), CLI_VERSION).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Err(e) if reliverse_core::is_cancelled(&e) => Ok(()),
        other => other,
    }
}
