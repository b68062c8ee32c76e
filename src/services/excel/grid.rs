use calamine::{Data, Range};

use super::types::{to_cell, Cell};

/// Read-only view of one sheet, addressed from A1 regardless of where the
/// used area starts. Row 0 is data, never a header.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    range: Range<Data>,
    height: u32,
    width: u32,
}

impl SheetGrid {
    pub fn new(range: Range<Data>) -> Self {
        let (height, width) = match range.end() {
            Some((row, col)) if !range.is_empty() => (row + 1, col + 1),
            _ => (0, 0),
        };
        Self {
            range,
            height,
            width,
        }
    }

    /// Number of rows from row 0 down to the last used row.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of columns from column A to the last used column.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.height && col < self.width
    }

    /// Value at an absolute zero-based position; absent when outside the
    /// populated bounds or empty.
    pub fn get(&self, row: u32, col: u32) -> Cell {
        if !self.contains(row, col) {
            return None;
        }
        to_cell(self.range.get_value((row, col)))
    }

    /// Inclusive rectangle clamped to the populated bounds, slice style:
    /// anything past the edge is cut off rather than padded.
    pub fn slice(&self, start: (u32, u32), end: (u32, u32)) -> (usize, Vec<Vec<Cell>>) {
        let row_end = end.0.min(self.height.saturating_sub(1));
        let col_end = end.1.min(self.width.saturating_sub(1));

        let height = if start.0 < self.height {
            (row_end - start.0 + 1) as usize
        } else {
            0
        };
        let width = if start.1 < self.width {
            (col_end - start.1 + 1) as usize
        } else {
            0
        };

        let rows = (0..height as u32)
            .map(|r| {
                (0..width as u32)
                    .map(|c| self.get(start.0 + r, start.1 + c))
                    .collect()
            })
            .collect();

        (width, rows)
    }
}
