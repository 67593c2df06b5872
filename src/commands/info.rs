//! `bazenv info` command implementation.

use crate::bazel::{BazelExecutor, Verbosity};
use crate::error::Result;
use std::path::PathBuf;

/// Output format for environment info.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the info command.
pub struct InfoArgs {
    /// Project directory
    pub path: PathBuf,
    /// Output format
    pub format: OutputFormat,
    /// Path to Bazel executable
    pub bazel: PathBuf,
    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Execute the info command.
pub fn execute(args: InfoArgs) -> Result<()> {
    let project_dir = args.path.canonicalize().unwrap_or(args.path.clone());

    let executor = BazelExecutor::new(args.bazel, args.verbosity);
    let info = executor.info(&project_dir)?;

    match args.format {
        OutputFormat::Text => {
            println!("Bazel Environment");
            println!("=================");
            println!();
            println!("Workspace:      {}", info.workspace.display());
            println!("Execution root: {}", info.execution_root.display());
            println!("Output base:    {}", info.output_base.display());
            println!("External repos: {}", info.external_dir().display());
            println!("Project name:   {}", info.project_name());

            if args.verbosity >= 1 {
                println!();
                println!("All keys:");
                for (key, value) in &info.raw {
                    println!("  {}: {}", key, value);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&info.raw)?;
            println!("{}", json);
        }
    }

    Ok(())
}
