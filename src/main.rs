//! Bazenv CLI entry point.

use bazenv::bazel::find_bazel;
use bazenv::commands::{clean, info, venv, version};
use bazenv::config::Config;
use bazenv::error::{BazenvError, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bazenv")]
#[command(about = "Bazel Python development environment CLI")]
#[command(version)]
#[command(author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to Bazel executable (overrides auto-detection)
    #[arg(long, global = true, env = "BAZEL_PATH")]
    bazel: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the project virtualenv and link Bazel-managed packages into it
    Venv {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also link first-party libraries from python/libraries
        #[arg(long)]
        lib: bool,

        /// Update a multi-root VS Code workspace file instead of
        /// .vscode/settings.json
        #[arg(long)]
        vscode_workspace: Option<PathBuf>,

        /// Skip updating VS Code settings
        #[arg(long)]
        no_vscode: bool,
    },

    /// Locate version.bzl files and pick one interactively
    Version {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Version action: show (default), patch, minor, major, or X.Y.Z
        #[arg(default_value = "show")]
        action: String,

        /// Operate on a specific version.bzl instead of picking interactively
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show Bazel environment info
    Info {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove the project virtualenv and its alias
    Clean {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for info::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => info::OutputFormat::Text,
            OutputFormat::Json => info::OutputFormat::Json,
        }
    }
}

fn main() {
    if let Err(e) = run_cli() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbose;

    // Load optional config
    let config = Config::load_from_cwd()?.unwrap_or_default();

    // Determine Bazel path (CLI > config > auto-detect)
    let bazel_path = || -> Result<PathBuf> {
        let path = if let Some(ref path) = cli.bazel {
            path.clone()
        } else if let Some(ref path) = config.bazel_path {
            path.clone()
        } else {
            return find_bazel().ok_or(BazenvError::BazelNotFound);
        };

        // Validate the specified path exists
        if !path.exists() {
            return Err(BazenvError::BazelCommandFailed(format!(
                "Bazel not found at specified path: {}",
                path.display()
            )));
        }

        Ok(path)
    };

    match cli.command {
        Command::Venv {
            path,
            lib,
            vscode_workspace,
            no_vscode,
        } => venv::execute(venv::VenvArgs {
            path,
            lib: lib || config.include_libraries,
            vscode_workspace: vscode_workspace.or(config.vscode_workspace),
            no_vscode,
            python: venv::resolve_python(config.python_path)?,
            bazel: bazel_path()?,
            verbosity,
        }),

        Command::Version { path, action, file } => {
            let version_action = parse_version_action(&action)?;
            version::execute(version::VersionArgs {
                path,
                action: version_action,
                file,
            })
        }

        Command::Info { path, format } => info::execute(info::InfoArgs {
            path,
            format: format.into(),
            bazel: bazel_path()?,
            verbosity,
        }),

        Command::Clean { path, dry_run } => clean::execute(clean::CleanArgs {
            path,
            aliases_dir: dirs::home_dir()
                .ok_or(BazenvError::HomeNotFound)?
                .join(".virtualenvs"),
            dry_run,
        }),

        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "bazenv", &mut io::stdout());
            Ok(())
        }
    }
}

/// Parse version action string into VersionAction enum.
fn parse_version_action(action: &str) -> Result<version::VersionAction> {
    match action {
        "show" => Ok(version::VersionAction::Show),
        "patch" => Ok(version::VersionAction::BumpPatch),
        "minor" => Ok(version::VersionAction::BumpMinor),
        "major" => Ok(version::VersionAction::BumpMajor),
        _ => {
            // Check if it's a valid version string (X.Y.Z)
            if action.split('.').count() == 3
                && action.split('.').all(|part| part.parse::<u32>().is_ok())
            {
                Ok(version::VersionAction::Set(action.to_string()))
            } else {
                Err(BazenvError::ConfigError(format!(
                    "Invalid version action '{}'. Use: show, patch, minor, major, or X.Y.Z",
                    action
                )))
            }
        }
    }
}
