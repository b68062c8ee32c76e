use std::path::PathBuf;

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No candidate workbook in the folder; nothing written.
    NoFiles,
    /// Workbooks were found but nothing could be extracted; nothing written.
    NoData,
    Written {
        path: PathBuf,
        rows: usize,
        /// Workbooks that contributed at least one record.
        workbooks: usize,
    },
}
