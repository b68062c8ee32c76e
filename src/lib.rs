//! Pulls fixed cells and ranges out of a folder of xlsx workbooks and
//! consolidates them into one output workbook.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use models::RunOutcome;
pub use services::excel::types::{Block, Cell, SheetCells};
pub use services::file_processor::{consolidate, summarize, FailurePolicy, PipelineOptions, SheetPlan};
pub use services::table::Layout;
