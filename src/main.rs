//! # gom CLI Entry Point
//!
//! Parses arguments with clap, builds a [`Config`] from the global flags and
//! dispatches each task to the library.
//!
//! ## Tasks
//!
//! - **Vendoring**: `install`, `build_deps`, `check`, `lock`
//! - **Gated toolchain**: `build`, `test`, `run`, `exec`
//! - **Plain toolchain**: `doc`, `tool`, `fmt`
//! - **Scaffolding**: `gen travis-yml`, `completion`

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gom::ci;
use gom::config::{Config, VENDOR_NAME_ENV};
use gom::filter::ActiveEnvironment;
use gom::orchestrator::{Orchestrator, Project};

/// Environment variable holding the tracing filter directive.
const LOG_ENV: &str = "GOM_LOG";

#[derive(Parser)]
#[command(name = "gom")]
#[command(about = "Go manager: bundle Go packages per project", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Include dependencies of the production group
    #[arg(long, global = true)]
    production: bool,
    /// Include dependencies of the development group (default)
    #[arg(long, global = true)]
    development: bool,
    /// Include dependencies of the test group
    #[arg(long, global = true)]
    test: bool,
    /// Comma-separated list of extra Gomfile groups
    #[arg(long, global = true, default_value = "")]
    groups: String,
    /// Vendor directory, relative to the Gomfile
    #[arg(long, global = true, env = VENDOR_NAME_ENV, hide_env_values = true)]
    vendor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install bundled packages into the vendor directory
    #[command(visible_alias = "i")]
    Install {
        /// Flags passed to `go get` and `go install`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Build vendored packages without downloading them
    #[command(name = "build_deps")]
    BuildDeps {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Build with vendored packages
    #[command(visible_alias = "b")]
    Build {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run tests with vendored packages
    #[command(visible_alias = "t")]
    Test {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run a Go file with vendored packages
    #[command(visible_alias = "r")]
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run godoc for vendored packages
    #[command(visible_alias = "d")]
    Doc {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Execute a command with the vendor environment
    #[command(visible_alias = "e")]
    Exec {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Run go tool with vendored packages
    Tool {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run go fmt
    Fmt {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Check that vendored dependencies match the Gomfile
    Check,
    /// Generate Gomfile.lock from the vendored checkouts
    #[command(visible_alias = "l")]
    Lock,
    /// Generate project files
    #[command(visible_alias = "g")]
    Gen {
        #[command(subcommand)]
        target: GenTarget,
    },
    /// Generate shell completions
    Completion { shell: Shell },
}

#[derive(Subcommand)]
enum GenTarget {
    /// Generate a .travis.yml that runs `gom test`
    TravisYml,
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "gom:".red().bold(), err);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let environment =
        ActiveEnvironment::with_group_list(cli.production, cli.development, cli.test, &cli.groups);
    let config = Config::new(cli.vendor, environment);
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
        Commands::Gen {
            target: GenTarget::TravisYml,
        } => {
            ci::generate_travis_yml(&std::env::current_dir()?)?;
            Ok(())
        }
        command => {
            let project = Project::discover(&std::env::current_dir()?, &config)?;
            let orchestrator = Orchestrator::new(project, config);
            dispatch(&orchestrator, command)
        }
    }
}

fn dispatch(orchestrator: &Orchestrator, command: Commands) -> Result<()> {
    match command {
        Commands::Install { args } => {
            orchestrator.install(&args)?;
            println!("{} All dependencies installed", "✓".green());
        }
        Commands::BuildDeps { args } => orchestrator.build_deps(&args)?,
        Commands::Build { args } => orchestrator.gated(&go(&["build"], args))?,
        Commands::Test { args } => orchestrator.gated(&go(&["test"], args))?,
        Commands::Run { args } => orchestrator.gated(&go(&["run"], args))?,
        Commands::Exec { command } => orchestrator.gated(&command)?,
        Commands::Doc { args } => orchestrator.ungated(&with_program("godoc", &[], args))?,
        Commands::Tool { args } => orchestrator.ungated(&go(&["tool"], args))?,
        Commands::Fmt { args } => orchestrator.ungated(&go(&["fmt"], args))?,
        Commands::Check => {
            orchestrator.check()?;
            println!("{} Vendored dependencies match the Gomfile", "✓".green());
        }
        Commands::Lock => {
            orchestrator.lock()?;
        }
        Commands::Gen { .. } | Commands::Completion { .. } => unreachable!("handled before project discovery"),
    }
    Ok(())
}

fn go(subcommand: &[&str], args: Vec<String>) -> Vec<String> {
    with_program("go", subcommand, args)
}

fn with_program(program: &str, prefix: &[&str], args: Vec<String>) -> Vec<String> {
    std::iter::once(program)
        .chain(prefix.iter().copied())
        .map(String::from)
        .chain(args)
        .collect()
}
