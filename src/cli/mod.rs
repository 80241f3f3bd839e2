//! Command-line interface for preflight
//!
//! - `run`: run the pre-commit/pre-push gates
//! - `mirror-ci`: list or run the CI workflows locally
//! - `doctor`: project health report
//! - `install-hooks`: install git hooks that run the gates
//! - `completions`: generate shell completions

pub mod completions;
pub mod doctor;
pub mod gate;
pub mod hooks;
pub mod mirror;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use preflight::infrastructure::{Config, init_logging};
use preflight::plan::PYTHON_ENV;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Environment variable that enables debug logging
pub const DEBUG_ENV: &str = "PREFLIGHT_DEBUG";

/// CLI arguments for preflight
#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a gate and print its verdict
    Run {
        /// Gate to run: pre-commit, pre-push or all
        #[arg(long, default_value = "pre-commit")]
        gate: GateArg,
        /// Print JSON instead of the summary table
        #[arg(long)]
        json: bool,
        /// Refuse to run without a valid license key
        #[arg(long)]
        require_license: bool,
        /// License key
        #[arg(long, env = "PREFLIGHT_LICENSE_KEY", hide_env_values = true)]
        license_key: Option<String>,
    },

    /// Show or run the CI workflows locally
    MirrorCi {
        /// Execute the plan instead of listing it
        #[arg(long)]
        run: bool,
        /// Run every step instead of stopping at the first failure
        #[arg(long, requires = "run")]
        bulk: bool,
        /// License key
        #[arg(long, env = "PREFLIGHT_LICENSE_KEY", hide_env_values = true)]
        license_key: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
        /// Interpreter that replaces `python`/`pytest` in step commands
        #[arg(long, env = PYTHON_ENV)]
        python: Option<String>,
    },

    /// Report project health
    Doctor {
        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
        /// Run checks in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Install git hooks that run the gates
    InstallHooks,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Gate selection on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GateArg {
    /// Fast checks before committing
    PreCommit,
    /// Full checks before pushing
    PrePush,
    /// Both gates, in order
    All,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    execute(Args::parse())
}

fn execute(args: Args) -> Result<ExitCode> {
    let root = args.root;

    if let Command::Completions { shell, output } = args.command {
        let script = completions::generate_completions(shell)?;
        match output {
            Some(path) => completions::save_completions(&script, &path)?,
            None => print!("{script}"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&root)?;
    if args.verbose || std::env::var_os(DEBUG_ENV).is_some() {
        init_logging(if args.verbose { "debug" } else { &config.log_level });
    }

    let ok = match args.command {
        Command::Run {
            gate,
            json,
            require_license,
            license_key,
        } => gate::run_gate_command(
            &root,
            config,
            &gate::GateOptions {
                gate,
                json,
                require_license,
                license_key,
            },
        )?,
        Command::MirrorCi {
            run,
            bulk,
            license_key,
            json,
            python,
        } => mirror::mirror_ci(
            &root,
            &config,
            &mirror::MirrorOptions {
                run,
                bulk,
                license_key,
                json,
                python,
            },
        )?,
        Command::Doctor { json, parallel } => doctor::doctor_command(&root, &config, json, parallel)?,
        Command::InstallHooks => {
            for path in hooks::install_hooks(&root)? {
                println!("Installed {}", path.display());
            }
            true
        }
        Command::Completions { .. } => true,
    };

    Ok(exit_status(ok))
}

fn load_config(root: &Path) -> Result<Config> {
    Config::load(root).with_context(|| format!("Failed to load configuration from {}", root.display()))
}

/// Maps a boolean outcome to the process exit status
pub fn exit_status(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
