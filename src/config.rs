use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::services::excel::types::SheetCells;
use crate::services::table::Layout;

pub const CONFIG_ENV: &str = "CELL_EXTRACT_CONFIG";
pub const FOLDER_ENV: &str = "CELL_EXTRACT_FOLDER";
pub const OUTPUT_ENV: &str = "CELL_EXTRACT_OUTPUT";

const DEFAULT_OUTPUT: &str = "Payment_breakup.xlsx";
const DEFAULT_SUMMARY_OUTPUT: &str = "Summary.xlsx";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub folder: PathBuf,
    /// Defaults to `Payment_breakup.xlsx` inside `folder`.
    pub output: Option<PathBuf>,
    /// Defaults to `Summary.xlsx` inside `folder`.
    pub summary_output: Option<PathBuf>,
    pub sheets: Vec<SheetCells>,
    pub summary_cells: Vec<String>,
    pub layout: Layout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            output: None,
            summary_output: None,
            sheets: vec![
                SheetCells::new("Payout Breakup", ["C4", "D4", "E4", "F4"]),
                SheetCells::new("Summary", ["B5", "B8", "C12"]),
            ],
            summary_cells: ["B5", "B6", "B7", "B8", "B9", "C12", "C13", "C14", "C15", "C16"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            layout: Layout::PerSheet,
        }
    }
}

impl Config {
    /// Loads `.env`, then the JSON file at `path` (or `$CELL_EXTRACT_CONFIG`),
    /// then the folder/output environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_json(&text)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(folder) = lookup(FOLDER_ENV).filter(|v| !v.is_empty()) {
            self.folder = PathBuf::from(folder);
        }
        if let Some(output) = lookup(OUTPUT_ENV).filter(|v| !v.is_empty()) {
            self.output = Some(PathBuf::from(output));
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if let Some(sheet) = self.sheets.iter().find(|s| s.name.trim().is_empty()) {
            return Err(AppError::Config(format!(
                "sheet entry with cells {:?} has an empty name",
                sheet.cells
            )));
        }

        let mut seen = HashSet::new();
        if let Some(sheet) = self.sheets.iter().find(|s| !seen.insert(s.name.as_str())) {
            return Err(AppError::Config(format!(
                "sheet {:?} is listed more than once; merge its cells into one entry",
                sheet.name
            )));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.folder.join(DEFAULT_OUTPUT))
    }

    pub fn summary_output_path(&self) -> PathBuf {
        self.summary_output
            .clone()
            .unwrap_or_else(|| self.folder.join(DEFAULT_SUMMARY_OUTPUT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_invoice_layout() {
        let config = Config::default();
        assert_eq!(config.sheets[0].name, "Payout Breakup");
        assert_eq!(config.sheets[0].cells, vec!["C4", "D4", "E4", "F4"]);
        assert_eq!(config.summary_cells.len(), 10);
        assert_eq!(config.output_path(), PathBuf::from(".").join("Payment_breakup.xlsx"));
        assert_eq!(config.summary_output_path(), PathBuf::from(".").join("Summary.xlsx"));
    }

    #[test]
    fn parses_json_and_keeps_sheet_order() {
        let config = Config::from_json(
            r#"{
                "folder": "/data/invoices",
                "sheets": [
                    {"name": "Summary", "cells": ["B5", "A1:C3"]},
                    {"name": "Payout Breakup", "cells": ["C4"]}
                ],
                "layout": "per_block"
            }"#,
        )
        .unwrap();

        assert_eq!(config.folder, PathBuf::from("/data/invoices"));
        let names: Vec<&str> = config.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Summary", "Payout Breakup"]);
        assert_eq!(config.sheets[0].cells, vec!["B5", "A1:C3"]);
        assert_eq!(config.layout, Layout::PerBlock);
        // Unset fields keep their defaults.
        assert_eq!(config.summary_cells.len(), 10);
        assert_eq!(config.output_path(), PathBuf::from("/data/invoices/Payment_breakup.xlsx"));
    }

    #[test]
    fn rejects_unknown_fields_and_empty_sheet_names() {
        assert!(matches!(Config::from_json(r#"{"folders": "x"}"#), Err(AppError::Config(_))));
        assert!(matches!(
            Config::from_json(r#"{"sheets": [{"name": " ", "cells": ["A1"]}]}"#),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn rejects_repeated_sheet_names() {
        let result = Config::from_json(
            r#"{"sheets": [
                {"name": "S", "cells": ["A1", "B1"]},
                {"name": "S", "cells": ["A1"]}
            ]}"#,
        );
        match result {
            Err(AppError::Config(message)) => assert!(message.contains("\"S\"")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn env_overrides_folder_and_output() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            FOLDER_ENV => Some("/in".to_string()),
            OUTPUT_ENV => Some("/out/result.xlsx".to_string()),
            _ => None,
        });
        assert_eq!(config.folder, PathBuf::from("/in"));
        assert_eq!(config.output_path(), PathBuf::from("/out/result.xlsx"));
        assert_eq!(config.summary_output_path(), PathBuf::from("/in/Summary.xlsx"));

        let mut untouched = Config::default();
        untouched.apply_env(|_| Some(String::new()));
        assert_eq!(untouched.folder, PathBuf::from("."));
    }
}
