use calamine::Data;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::collections::HashMap;
use std::path::Path;

use crate::error::AppError;
use crate::services::excel::types::{Block, Cell, ConsolidatedRecord};

pub const SOURCE_WORKBOOK: &str = "Source Workbook";
pub const SOURCE_SHEET: &str = "Source Sheet";
/// Carries the record's sequence number until the table is finalised.
pub const EXTRACTION_BLOCK: &str = "Extraction Block";

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Blocks of one sheet sit side by side, one record per sheet row.
    #[default]
    PerSheet,
    /// Every block contributes its own rows.
    PerBlock,
}

/// Collects tagged blocks for one run.
#[derive(Debug, Default)]
pub struct Accumulator {
    records: Vec<ConsolidatedRecord>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, workbook: &str, sheet: &str, sequence: usize, block: Block) {
        self.records.push(ConsolidatedRecord {
            workbook: workbook.to_string(),
            sheet: sheet.to_string(),
            sequence,
            block,
        });
    }

    /// Moves everything from `other` to the end of this accumulator.
    pub fn append(&mut self, other: Accumulator) {
        self.records.extend(other.records);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_table(self, layout: Layout, tag_provenance: bool) -> OutputTable {
        let mut table = OutputTable::default();
        if tag_provenance {
            table.column_index(SOURCE_WORKBOOK);
            table.column_index(SOURCE_SHEET);
            table.column_index(EXTRACTION_BLOCK);
        }

        match layout {
            Layout::PerBlock => {
                for record in &self.records {
                    table.append_record(record, tag_provenance);
                }
            }
            Layout::PerSheet => {
                for group in group_by_sheet(self.records) {
                    table.append_record(&merge_group(group), tag_provenance);
                }
            }
        }

        table
    }
}

/// Consecutive records from the same workbook and sheet, in sequence order.
fn group_by_sheet(records: Vec<ConsolidatedRecord>) -> Vec<Vec<ConsolidatedRecord>> {
    let mut groups: Vec<Vec<ConsolidatedRecord>> = Vec::new();
    for record in records {
        match groups.last_mut() {
            Some(group) if group[0].workbook == record.workbook && group[0].sheet == record.sheet => {
                group.push(record)
            }
            _ => groups.push(vec![record]),
        }
    }
    for group in &mut groups {
        group.sort_by_key(|r| r.sequence);
    }
    groups
}

/// Joins a sheet's blocks column-wise by row position. The result is as tall
/// as the tallest block; shorter blocks are padded with absent values.
fn merge_group(group: Vec<ConsolidatedRecord>) -> ConsolidatedRecord {
    let height = group.iter().map(|r| r.block.height()).max().unwrap_or(0);

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); height];

    for record in &group {
        for name in &record.block.columns {
            if columns.contains(name) {
                columns.push(format!("{} ({})", name, record.sequence));
            } else {
                columns.push(name.clone());
            }
        }

        let width = record.block.width();
        for (i, row) in rows.iter_mut().enumerate() {
            let start = row.len();
            if let Some(source) = record.block.rows.get(i) {
                row.extend(source.iter().take(width).cloned());
            }
            row.resize(start + width, None);
        }
    }

    let mut group = group.into_iter();
    let (workbook, sheet, sequence) = match group.next() {
        Some(first) => (first.workbook, first.sheet, first.sequence),
        None => (String::new(), String::new(), 0),
    };

    ConsolidatedRecord {
        workbook,
        sheet,
        sequence,
        block: Block { columns, rows },
    }
}

/// Final table: named columns, rows aligned to them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl OutputTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in row `row`; `None` for absent cells and unknown
    /// columns alike.
    pub fn value(&self, row: usize, column: &str) -> Option<&Data> {
        let col = *self.index.get(column)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }

    fn column_index(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), self.columns.len() - 1);
        self.columns.len() - 1
    }

    fn append_record(&mut self, record: &ConsolidatedRecord, tag_provenance: bool) {
        let positions: Vec<usize> = record
            .block
            .columns
            .iter()
            .map(|n| self.column_index(n))
            .collect();
        let provenance = if tag_provenance {
            Some((
                self.column_index(SOURCE_WORKBOOK),
                self.column_index(SOURCE_SHEET),
                self.column_index(EXTRACTION_BLOCK),
            ))
        } else {
            None
        };

        for source in &record.block.rows {
            let mut row: Vec<Cell> = vec![None; self.columns.len()];
            if let Some((w, s, b)) = provenance {
                row[w] = Some(Data::String(record.workbook.clone()));
                row[s] = Some(Data::String(record.sheet.clone()));
                row[b] = Some(Data::Int(record.sequence as i64));
            }
            for (value, &col) in source.iter().zip(&positions) {
                row[col] = value.clone();
            }
            self.rows.push(row);
        }
        self.pad_rows();
    }

    fn pad_rows(&mut self) {
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }
    }

    /// Removes a column if present.
    pub fn drop_column(&mut self, name: &str) {
        let Some(col) = self.index.remove(name) else {
            return;
        };
        self.columns.remove(col);
        for row in &mut self.rows {
            if col < row.len() {
                row.remove(col);
            }
        }
        for (i, n) in self.columns.iter().enumerate() {
            self.index.insert(n.clone(), i);
        }
    }

    /// Writes the table as a new workbook at `path`, replacing any file there.
    pub fn write_xlsx(&self, path: &Path, style: &OutputStyle) -> Result<(), AppError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        if let Some(name) = &style.sheet_name {
            worksheet.set_name(name)?;
        }

        let date_format = Format::new().set_num_format(DATETIME_FORMAT);
        let header_format = Format::new().set_bold();

        let col_offset: u16 = if style.index { 1 } else { 0 };
        let mut row_offset: u32 = 0;

        if style.header {
            for (i, name) in self.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col_offset + i as u16, name, &header_format)?;
            }
            row_offset = 1;
        }

        for (r, row) in self.rows.iter().enumerate() {
            let xl_row = row_offset + r as u32;
            if style.index {
                worksheet.write_number(xl_row, 0, r as f64)?;
            }
            for (c, value) in row.iter().enumerate() {
                if let Some(value) = value {
                    write_value(worksheet, xl_row, col_offset + c as u16, value, &date_format)?;
                }
            }
        }

        workbook.save(path)?;
        tracing::debug!("Wrote {} rows x {} columns to {}", self.rows.len(), self.columns.len(), path.display());
        Ok(())
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Data,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        Data::Empty => {}
        Data::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Data::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Data::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Data::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(d) => {
            worksheet.write_number_with_format(row, col, d.as_f64(), date_format)?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

/// How the output sheet is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStyle {
    /// `None` keeps the writer's default sheet name.
    pub sheet_name: Option<String>,
    pub header: bool,
    pub index: bool,
}

impl OutputStyle {
    /// Header row plus a leading zero-based row index column.
    pub fn indexed_table() -> Self {
        Self {
            sheet_name: None,
            header: true,
            index: true,
        }
    }

    /// Bare rows on a named sheet.
    pub fn plain_rows(sheet_name: &str) -> Self {
        Self {
            sheet_name: Some(sheet_name.to_string()),
            header: false,
            index: false,
        }
    }
}
