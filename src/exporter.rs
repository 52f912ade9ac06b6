use std::fs;
use std::path::Path;
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use log::info;
use crate::error::StoreError;
use crate::table::{temp_path, RecordTable};

pub const FRESHER_DROPPED: &[&str] = &["Posting_Time", "Qualification", "Employment_Type"];
pub const IT_DROPPED: &[&str] = &["Posting_Date", "Qualification", "Employment_Type"];

/// Column order of the combined export. Anything else is left out.
pub const EXPORT_COLUMNS: &[&str] = &[
    "Company",
    "Industry",
    "Job_Title",
    "Experience",
    "Salary",
    "Location",
    "Description",
    "Skills",
    "URL",
];

const SHEET_NAME: &str = "Sheet1";

/// Prunes source-specific columns, stacks fresher rows above IT rows and
/// projects onto [`EXPORT_COLUMNS`].
pub fn merge(mut fresher: RecordTable, mut it: RecordTable) -> RecordTable {
    fresher.drop_columns(FRESHER_DROPPED);
    it.drop_columns(IT_DROPPED);
    fresher.concat(it).select(EXPORT_COLUMNS)
}

/// Header row followed by one row per record; nulls are left blank.
pub fn write_workbook<P: AsRef<Path>>(table: &RecordTable, path: P) -> Result<(), StoreError> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col as u16, name.as_str())?;
    }
    for (row, cells) in table.rows().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string(row as u32 + 1, col as u16, value.as_str())?;
            }
        }
    }

    let tmp = temp_path(path);
    workbook.save(&tmp)?;
    fs::rename(&tmp, path)?;
    info!("[FINAL] Saved {} combined rows to {:?}", table.len(), path);
    Ok(())
}

/// Loads the first sheet of a workbook, first row as header.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<RecordTable, StoreError> {
    let mut excel: Xlsx<_> = open_workbook(path.as_ref())?;
    let worksheets = excel.worksheets();
    let Some((_name, range)) = worksheets.first() else {
        return Ok(RecordTable::default());
    };

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => return Ok(RecordTable::default()),
    };
    let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    let mut table = RecordTable::new(&header_refs);

    for cells in rows {
        table.push_row(cells.iter().map(cell_value).collect());
    }
    Ok(table)
}

fn cell_value(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }
}
