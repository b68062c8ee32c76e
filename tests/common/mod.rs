#![allow(dead_code)]

use calamine::{open_workbook, Data, Reader, Xlsx};
use cell_extract::services::excel::resolve;
use regex::Regex;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub enum Value<'a> {
    Num(f64),
    Text(&'a str),
}

pub struct SheetSpec<'a> {
    pub name: &'a str,
    pub cells: Vec<(&'a str, Value<'a>)>,
    pub active: bool,
}

pub fn sheet<'a>(name: &'a str, cells: Vec<(&'a str, Value<'a>)>) -> SheetSpec<'a> {
    SheetSpec {
        name,
        cells,
        active: false,
    }
}

pub fn active<'a>(name: &'a str, cells: Vec<(&'a str, Value<'a>)>) -> SheetSpec<'a> {
    SheetSpec {
        name,
        cells,
        active: true,
    }
}

pub fn write_workbook(path: &Path, sheets: Vec<SheetSpec<'_>>) {
    let mut workbook = Workbook::new();
    for spec in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(spec.name).unwrap();
        for (address, value) in spec.cells {
            let (row, col) = resolve(address).unwrap();
            match value {
                Value::Num(n) => {
                    worksheet.write_number(row, col as u16, n).unwrap();
                }
                Value::Text(s) => {
                    worksheet.write_string(row, col as u16, s).unwrap();
                }
            }
        }
        if spec.active {
            worksheet.set_active(true);
        }
    }
    workbook.save(path).unwrap();
}

/// All rows of `sheet_name`, anchored at A1, with empty cells as `Data::Empty`.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Vec<Vec<Data>> {
    let mut book: Xlsx<_> = open_workbook(path).unwrap();
    let range = book.worksheet_range(sheet_name).unwrap();
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_row)
        .map(|r| {
            (0..=last_col)
                .map(|c| range.get_value((r, c)).cloned().unwrap_or(Data::Empty))
                .collect()
        })
        .collect()
}

pub fn text(s: &str) -> Data {
    Data::String(s.to_string())
}

pub fn num(n: f64) -> Data {
    Data::Float(n)
}

/// Rewrites one part of a saved workbook in place, leaving the rest intact.
pub fn rewrite_part(path: &Path, part: &str, edit: impl FnOnce(String) -> String) {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        entries.push((entry.name().to_string(), bytes));
    }
    drop(archive);

    let mut edit = Some(edit);
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        if name == part {
            let edit = edit.take().unwrap();
            let xml = edit(String::from_utf8(bytes).unwrap());
            writer.write_all(xml.as_bytes()).unwrap();
        } else {
            writer.write_all(&bytes).unwrap();
        }
    }
    writer.finish().unwrap();
    assert!(edit.is_none(), "{} not found in {}", part, path.display());
}

/// Points the workbook's active tab past its last sheet.
pub fn break_active_tab(path: &Path) {
    let existing = Regex::new(r#"\sactiveTab="\d+""#).unwrap();
    rewrite_part(path, "xl/workbook.xml", |xml| {
        let xml = existing.replace_all(&xml, "");
        xml.replacen("<workbookView ", "<workbookView activeTab=\"5\" ", 1)
    });
}

/// Replaces the first worksheet with one holding a numeric cell that is not a number.
pub fn break_first_sheet(path: &Path) {
    rewrite_part(path, "xl/worksheets/sheet1.xml", |_| {
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<sheetData><row r="1"><c r="A1"><v>abc</v></c></row></sheetData></worksheet>"#
        )
        .to_string()
    });
}
