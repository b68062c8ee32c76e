use super::grid::SheetGrid;
use super::reference::{column_name, Reference};
use super::types::Block;
use crate::error::AppError;

pub struct SheetExtractor {
    allow_ranges: bool,
}

impl Default for SheetExtractor {
    fn default() -> Self {
        Self { allow_ranges: true }
    }
}

impl SheetExtractor {
    /// Extractor that only accepts single-cell references.
    pub fn cells_only() -> Self {
        Self {
            allow_ranges: false,
        }
    }

    pub fn new(allow_ranges: bool) -> Self {
        Self { allow_ranges }
    }

    /// One block per reference, in the order given.
    pub fn extract<S: AsRef<str>>(&self, grid: &SheetGrid, references: &[S]) -> Result<Vec<Block>, AppError> {
        references
            .iter()
            .map(|r| self.extract_one(grid, r.as_ref()))
            .collect()
    }

    fn extract_one(&self, grid: &SheetGrid, text: &str) -> Result<Block, AppError> {
        let reference = Reference::parse(text)?;

        match reference {
            Reference::Cell { text, row, col } => Ok(Block::single(&text, grid.get(row, col))),
            Reference::Range { text, .. } if !self.allow_ranges => Err(AppError::RangeNotSupported(text)),
            Reference::Range { text, start, end } => {
                let (width, rows) = grid.slice(start, end);
                let columns = (1..=width).map(|i| format!("{}_Col{}", text, i)).collect();
                tracing::debug!(
                    "Range {} covers {}{}:{}{}, {} rows x {} columns inside the sheet",
                    text,
                    column_name(start.1),
                    start.0 + 1,
                    column_name(end.1),
                    end.0 + 1,
                    rows.len(),
                    width
                );
                Ok(Block { columns, rows })
            }
        }
    }
}

/// Shorthand for range-aware extraction.
pub fn extract<S: AsRef<str>>(grid: &SheetGrid, references: &[S]) -> Result<Vec<Block>, AppError> {
    SheetExtractor::default().extract(grid, references)
}
