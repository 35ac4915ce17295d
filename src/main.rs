//! pybundle - standalone executables from Python entry points.
//!
//! Creates a throwaway venv, installs PyInstaller and the project's
//! requirements into it, packages one script in one-file mode, moves the
//! executable next to the sources and deletes everything else.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pybundle::commands::{self, build::BuildOptions, show::ShowTarget};
use pybundle::config::{self, Config};

#[derive(Parser)]
#[command(name = "pybundle")]
#[command(version, about = "Build standalone executables from Python scripts")]
#[command(
    after_help = "QUICK START:\n  pybundle preflight app.py  Check interpreter and inputs\n  pybundle build app.py      Produce ./app (app.exe on Windows)\n  pybundle clean             Remove state left by a failed build"
)]
struct Cli {
    /// Debug logging and streamed pip/packager output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "directory", global = true)]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package an entry-point script into a single executable
    Build {
        /// Entry-point script (e.g. catxl.py)
        entry: PathBuf,

        /// Host interpreter used to create the venv
        #[arg(long)]
        python: Option<String>,

        /// Dependency manifest
        #[arg(short, long)]
        requirements: Option<PathBuf>,

        /// Venv directory
        #[arg(long)]
        env_dir: Option<PathBuf>,

        /// Skip installing the dependency manifest
        #[arg(long)]
        no_deps: bool,

        /// Remove transient state when a step fails (default: true)
        #[arg(long, value_parser = config::parse_bool)]
        cleanup_on_failure: Option<bool>,

        /// Write a JSON build report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Run strict preflight checks before building
        #[arg(long)]
        preflight: bool,

        /// Extra arguments passed to the packager
        #[arg(last = true)]
        packager_args: Vec<String>,
    },

    /// Run preflight checks
    Preflight {
        /// Entry-point script to validate
        entry: Option<PathBuf>,

        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },

    /// Remove leftover build state (venv, build/, dist/, .spec files)
    Clean {
        /// Only remove the .spec file belonging to this entry point
        entry: Option<PathBuf>,

        /// Remove a build lock left behind by a killed process
        #[arg(long)]
        force: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowCommand,
    },
}

#[derive(Subcommand)]
enum ShowCommand {
    /// Show effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which build paths exist
    Status {
        /// Entry point whose artifact and .spec file to include
        entry: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    // Absolute, so paths handed to child processes survive their cwd change.
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    let work_dir = match cli.directory {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    let mut config = Config::load(&work_dir)?;
    config.verbose = cli.verbose;

    match cli.command {
        Commands::Build {
            entry,
            python,
            requirements,
            env_dir,
            no_deps,
            cleanup_on_failure,
            report,
            preflight,
            packager_args,
        } => {
            if let Some(python) = python {
                config.python = python;
            }
            if let Some(requirements) = requirements {
                config.requirements = config.resolve(&requirements);
            }
            if let Some(env_dir) = env_dir {
                config.env_dir = config.resolve(&env_dir);
            }
            if let Some(cleanup) = cleanup_on_failure {
                config.cleanup_on_failure = cleanup;
            }
            config.install_deps = !no_deps;
            config.packager_args = packager_args;

            let options = BuildOptions {
                entry,
                report,
                preflight,
            };
            commands::cmd_build(&config, &options)?;
        }

        Commands::Preflight { entry, strict } => {
            commands::cmd_preflight(&config, entry.as_deref(), strict)?;
        }

        Commands::Clean { entry, force } => {
            commands::cmd_clean(&config, entry.as_deref(), force)?;
        }

        Commands::Show { what } => {
            let (target, entry) = match what {
                ShowCommand::Config { json } => (ShowTarget::Config { json }, None),
                ShowCommand::Status { entry } => (ShowTarget::Status, entry),
            };
            commands::cmd_show(&config, target, entry.as_deref())?;
        }
    }

    Ok(())
}
