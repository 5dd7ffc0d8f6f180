//! GOS integrity scan report generator.
//!
//! Renders a scan result saved by `gosaudit-collect` into Markdown
//! documentation or normalized JSON.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gosaudit::{OutputFormat, load_result, render};
use gosaudit_core::init_logging;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for the report generator
#[derive(Parser)]
#[command(name = "gosaudit")]
#[command(about = "GOS integrity scan report generator")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a saved scan result
    Report {
        /// Input scan result file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command {
        Command::Report {
            input,
            format,
            output,
        } => {
            let result = load_result(&input)?;
            info!(
                "Rendering scan {} for system {}",
                result.scan_id, result.system_name
            );

            let rendered = render(&result, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Report written to {}", path.display());
                }
                None => print!("{}", rendered),
            }
        }
    }

    Ok(())
}
