pub mod extractor;
pub mod grid;
pub mod reference;
pub mod types;
pub mod workbook;

pub use extractor::{extract, SheetExtractor};
pub use grid::SheetGrid;
pub use reference::{resolve, Reference};
pub use workbook::WorkbookSource;
