use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::RunOutcome;
use crate::services::excel::types::SheetCells;
use crate::services::excel::{Reference, SheetExtractor, WorkbookSource};
use crate::services::table::{Accumulator, Layout, OutputStyle, EXTRACTION_BLOCK};

const WORKBOOK_EXTENSION: &str = ".xlsx";
const LOCK_FILE_PREFIX: &str = "~$";
const HIDDEN_FILE_PREFIX: char = '.';

pub const SUMMARY_SHEET_NAME: &str = "Summary Data";

/// What to do when a workbook or sheet cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log it and move on to the next sheet or workbook.
    #[default]
    Skip,
    /// End the run with the error.
    Abort,
}

/// Which sheets of each workbook to read, and what to read from them.
#[derive(Debug, Clone)]
pub enum SheetPlan {
    /// Named sheets, each with its own references. Sheets missing from a
    /// workbook are ignored.
    Named(Vec<SheetCells>),
    /// The workbook's active sheet, with one list of cells for every file.
    Active(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Ignore `~$` lock files and dot files.
    pub skip_transient: bool,
    pub allow_ranges: bool,
    /// Prepend source workbook and sheet columns.
    pub tag_provenance: bool,
    pub on_error: FailurePolicy,
    pub layout: Layout,
    pub output: OutputStyle,
    /// Write the output even when nothing was extracted.
    pub write_when_empty: bool,
    /// Logged after the output is written, followed by its path.
    pub done_message: &'static str,
}

impl PipelineOptions {
    /// Range-aware, provenance-tagged and fault-tolerant.
    pub fn consolidate() -> Self {
        Self {
            skip_transient: true,
            allow_ranges: true,
            tag_provenance: true,
            on_error: FailurePolicy::Skip,
            layout: Layout::PerSheet,
            output: OutputStyle::indexed_table(),
            write_when_empty: false,
            done_message: "Data successfully consolidated into",
        }
    }

    /// Active sheet only, single cells, one bare row per workbook.
    pub fn summary() -> Self {
        Self {
            skip_transient: false,
            allow_ranges: false,
            tag_provenance: false,
            on_error: FailurePolicy::Skip,
            layout: Layout::PerSheet,
            output: OutputStyle::plain_rows(SUMMARY_SHEET_NAME),
            write_when_empty: true,
            done_message: "Summary written to",
        }
    }
}

/// Pulls the configured sheets' cells and ranges out of every workbook in
/// `folder` into one table at `output`.
pub fn consolidate(
    folder: &Path,
    sheets: &[SheetCells],
    output: &Path,
    layout: Layout,
) -> Result<RunOutcome, AppError> {
    let options = PipelineOptions {
        layout,
        ..PipelineOptions::consolidate()
    };
    run(folder, &SheetPlan::Named(sheets.to_vec()), output, &options)
}

/// Appends one row per workbook holding `cells` from its active sheet.
pub fn summarize(
    folder: &Path,
    cells: &[String],
    output: &Path,
    on_error: FailurePolicy,
) -> Result<RunOutcome, AppError> {
    let options = PipelineOptions {
        on_error,
        ..PipelineOptions::summary()
    };
    run(folder, &SheetPlan::Active(cells.to_vec()), output, &options)
}

pub fn run(
    folder: &Path,
    plan: &SheetPlan,
    output: &Path,
    options: &PipelineOptions,
) -> Result<RunOutcome, AppError> {
    check_shared_cells(plan, options.allow_ranges)?;

    let files = list_workbooks(folder, options.skip_transient, Some(output))?;
    if files.is_empty() {
        tracing::info!("No Excel files found in folder: {}", folder.display());
        return finish_empty(RunOutcome::NoFiles, output, options);
    }
    tracing::info!("Found {} workbooks in {}", files.len(), folder.display());

    let extractor = SheetExtractor::new(options.allow_ranges);
    let mut accumulator = Accumulator::new();
    let mut contributing = 0;

    for path in &files {
        let name = display_name(path);
        tracing::info!("Processing workbook: {}", name);

        match process_workbook(path, plan, &extractor, options.on_error) {
            Ok(records) => {
                if !records.is_empty() {
                    contributing += 1;
                }
                tracing::debug!("{} produced {} blocks", name, records.len());
                accumulator.append(records);
            }
            Err(e) if options.on_error == FailurePolicy::Skip => {
                tracing::warn!("Skipping {}: {}", name, e);
            }
            Err(e) => {
                tracing::warn!("Aborting run at {}", name);
                return Err(e);
            }
        }
    }

    if accumulator.is_empty() {
        tracing::info!("No data extracted.");
        return finish_empty(RunOutcome::NoData, output, options);
    }

    let mut table = accumulator.into_table(options.layout, options.tag_provenance);
    table.drop_column(EXTRACTION_BLOCK);
    table.write_xlsx(output, &options.output)?;

    tracing::info!("{} {}", options.done_message, output.display());
    Ok(RunOutcome::Written {
        path: output.to_path_buf(),
        rows: table.height(),
        workbooks: contributing,
    })
}

/// A cell list applied to every workbook is checked once up front, so a bad
/// entry fails the run instead of skipping each file in turn.
fn check_shared_cells(plan: &SheetPlan, allow_ranges: bool) -> Result<(), AppError> {
    let SheetPlan::Active(cells) = plan else {
        return Ok(());
    };
    for text in cells {
        let reference = Reference::parse(text)?;
        if reference.is_range() && !allow_ranges {
            return Err(AppError::RangeNotSupported(reference.text().to_string()));
        }
    }
    Ok(())
}

/// Nothing was extracted: the output is still replaced with an empty sheet
/// when the options ask for it, but the run is not reported as written.
fn finish_empty(outcome: RunOutcome, output: &Path, options: &PipelineOptions) -> Result<RunOutcome, AppError> {
    if options.write_when_empty {
        let table = Accumulator::new().into_table(options.layout, options.tag_provenance);
        table.write_xlsx(output, &options.output)?;
        tracing::debug!("Wrote empty output to {}", output.display());
    }
    Ok(outcome)
}

/// Candidate workbooks in `folder`, sorted by file name. `exclude` keeps a
/// previous run's output from being read back as input.
pub fn list_workbooks(folder: &Path, skip_transient: bool, exclude: Option<&Path>) -> Result<Vec<PathBuf>, AppError> {
    let excluded = exclude.and_then(|p| p.canonicalize().ok());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if !name.ends_with(WORKBOOK_EXTENSION) {
            continue;
        }
        if skip_transient && (name.starts_with(LOCK_FILE_PREFIX) || name.starts_with(HIDDEN_FILE_PREFIX)) {
            tracing::debug!("Ignoring transient file {}", name);
            continue;
        }
        if !path.is_file() {
            continue;
        }
        if excluded.is_some() && path.canonicalize().ok() == excluded {
            tracing::debug!("Ignoring output file {}", name);
            continue;
        }

        files.push(path);
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Opens one workbook and extracts every planned sheet from it. The returned
/// accumulator holds only this workbook's records; on error none of them are
/// kept.
fn process_workbook(
    path: &Path,
    plan: &SheetPlan,
    extractor: &SheetExtractor,
    on_error: FailurePolicy,
) -> Result<Accumulator, AppError> {
    let mut workbook = WorkbookSource::open(path)?;
    let file_name = workbook.file_name().to_string();
    let mut records = Accumulator::new();

    let targets: Vec<(String, &[String])> = match plan {
        SheetPlan::Named(sheets) => {
            let available = workbook.sheet_names();
            let matching: Vec<(String, &[String])> = sheets
                .iter()
                .filter(|s| available.contains(&s.name))
                .map(|s| (s.name.clone(), s.cells.as_slice()))
                .collect();
            if matching.is_empty() {
                tracing::warn!("No matching sheets in {} for the configured sheet names", file_name);
            }
            matching
        }
        SheetPlan::Active(cells) => vec![(workbook.active_sheet()?, cells.as_slice())],
    };

    for (sheet_name, cells) in targets {
        let grid = match workbook.grid(&sheet_name) {
            Ok(grid) => grid,
            Err(e) if on_error == FailurePolicy::Skip => {
                tracing::warn!("Could not read sheet {} in {}: {}", sheet_name, file_name, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let blocks = extractor.extract(&grid, cells)?;
        for (idx, block) in blocks.into_iter().enumerate() {
            records.push(&file_name, &sheet_name, idx + 1, block);
        }
    }

    Ok(records)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
