use calamine::{open_workbook, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::grid::SheetGrid;
use crate::error::AppError;

/// An opened xlsx file. Dropping it releases the file handle.
pub struct WorkbookSource {
    path: PathBuf,
    file_name: String,
    workbook: Xlsx<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let workbook: Xlsx<_> = open_workbook(path).map_err(|e| AppError::WorkbookOpen {
            file: file_name.clone(),
            source: e,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            workbook,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// Loads a whole sheet. There is no header row: row 0 is data.
    pub fn grid(&mut self, sheet_name: &str) -> Result<SheetGrid, AppError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| AppError::SheetRead {
                sheet: sheet_name.to_string(),
                source: e,
            })?;
        Ok(SheetGrid::new(range))
    }

    /// Name of the sheet that was selected when the workbook was last saved.
    pub fn active_sheet(&self) -> Result<String, AppError> {
        let index = active_tab(&self.path).map_err(|message| AppError::ActiveSheet {
            file: self.file_name.clone(),
            message,
        })?;

        let names = self.workbook.sheet_names();
        names.get(index).cloned().ok_or_else(|| AppError::ActiveSheet {
            file: self.file_name.clone(),
            message: format!("active tab {} but workbook has {} sheets", index, names.len()),
        })
    }
}

/// Reads `activeTab` from the first `<workbookView>` of `xl/workbook.xml`.
/// A workbook without the attribute has its first sheet active.
fn active_tab(path: &Path) -> Result<usize, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| e.to_string())?;

    let mut xml = String::new();
    archive
        .by_name("xl/workbook.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    parse_active_tab(&xml)
}

fn parse_active_tab(xml: &str) -> Result<usize, String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"workbookView" {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"activeTab" {
                            let value = String::from_utf8_lossy(&attr.value);
                            return value
                                .trim()
                                .parse()
                                .map_err(|_| format!("invalid activeTab value {:?}", value));
                        }
                    }
                    return Ok(0);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(0)
}
