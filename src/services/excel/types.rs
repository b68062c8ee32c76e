use calamine::Data;

/// A cell value. `None` is an absent value, distinct from zero or "".
pub type Cell = Option<Data>;

/// One table produced from one cell or range reference.
///
/// Columns are tracked separately from rows: a range that lies below the
/// populated area still names its columns but has no rows, and one that lies
/// to the right of it has rows but no columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Block {
    pub fn single(name: &str, value: Cell) -> Self {
        Self {
            columns: vec![name.to_string()],
            rows: vec![vec![value]],
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// A block tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRecord {
    pub workbook: String,
    pub sheet: String,
    /// 1-based position of the reference within its sheet's list. Only used
    /// while assembling the output table.
    pub sequence: usize,
    pub block: Block,
}

/// Sheet name plus the references to pull from it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SheetCells {
    pub name: String,
    pub cells: Vec<String>,
}

impl SheetCells {
    pub fn new<S: Into<String>>(name: &str, cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

/// Normalises the reader's empty marker to an absent value.
pub fn to_cell(value: Option<&Data>) -> Cell {
    match value {
        None | Some(Data::Empty) => None,
        Some(v) => Some(v.clone()),
    }
}
