use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use cell_extract::{logging, services::file_processor, Config, FailurePolicy, Layout, RunOutcome};

/// Pull fixed cells out of a folder of xlsx workbooks into one workbook
#[derive(Parser)]
#[command(name = "cell-extract", version, about)]
struct Cli {
    /// JSON configuration file (default: $CELL_EXTRACT_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log per-block detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract configured cells and ranges from named sheets into one table
    Consolidate {
        /// Folder holding the workbooks
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Output workbook path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How blocks from the same sheet are laid out
        #[arg(long)]
        layout: Option<LayoutArg>,

        /// Stop at the first workbook or sheet that cannot be read
        #[arg(long)]
        strict: bool,
    },

    /// Append one row of fixed cells per workbook, read from its active sheet
    Summarize {
        /// Folder holding the workbooks
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Output workbook path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop at the first workbook that cannot be read
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    PerSheet,
    PerBlock,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::PerSheet => Layout::PerSheet,
            LayoutArg::PerBlock => Layout::PerBlock,
        }
    }
}

fn policy(strict: bool) -> FailurePolicy {
    if strict {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Skip
    }
}

fn run(cli: Cli) -> Result<RunOutcome> {
    let mut config = Config::load(cli.config.as_deref())?;

    let outcome = match cli.command {
        Commands::Consolidate { folder, output, layout, strict } => {
            if let Some(folder) = folder {
                config.folder = folder;
            }
            let output = output.unwrap_or_else(|| config.output_path());
            let options = file_processor::PipelineOptions {
                layout: layout.map(Layout::from).unwrap_or(config.layout),
                on_error: policy(strict),
                ..file_processor::PipelineOptions::consolidate()
            };
            file_processor::run(
                &config.folder,
                &file_processor::SheetPlan::Named(config.sheets.clone()),
                &output,
                &options,
            )?
        }
        Commands::Summarize { folder, output, strict } => {
            if let Some(folder) = folder {
                config.folder = folder;
            }
            let output = output.unwrap_or_else(|| config.summary_output_path());
            file_processor::summarize(&config.folder, &config.summary_cells, &output, policy(strict))?
        }
    };

    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(cli) {
        Ok(RunOutcome::Written { rows, workbooks, .. }) => {
            tracing::debug!("{} rows from {} workbooks", rows, workbooks);
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            tracing::debug!("Run finished with {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
