//! Ordered string table shared between pipeline stages.
//!
//! Every cell is an optional string. On disk a table is a CSV file with a
//! header row; a null cell is written as an empty field and an empty field
//! reads back as null, so tables round-trip through CSV unchanged as long as
//! present values are non-empty (which the extractors guarantee).

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use log::debug;
use crate::error::StoreError;

pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RecordTable {
    pub fn new(columns: &[&str]) -> Self {
        RecordTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// One-column table, as used for listing URL checkpoints.
    pub fn from_column(name: &str, values: &[String]) -> Self {
        let mut table = RecordTable::new(&[name]);
        for v in values {
            table.push_row(vec![Some(v.clone())]);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Appends a row, padding missing trailing cells with nulls.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Sets one cell, adding the column first if the table lacks it.
    pub fn set(&mut self, row: usize, column: &str, value: Option<String>) {
        let idx = self.add_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = value;
        }
    }

    pub fn column_values(&self, column: &str) -> Vec<Option<String>> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].clone()).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    /// Non-null values of a column, in row order.
    pub fn non_null_values(&self, column: &str) -> Vec<String> {
        self.column_values(column).into_iter().flatten().collect()
    }

    /// True when the column exists and none of its cells is null.
    pub fn column_complete(&self, column: &str) -> bool {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().all(|r| r[idx].is_some()),
            None => false,
        }
    }

    /// Index of `column`, appending it (all nulls) if absent.
    pub fn add_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.columns.push(column.to_string());
        for r in &mut self.rows {
            r.push(None);
        }
        self.columns.len() - 1
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self.columns.iter().map(|c| !names.contains(&c.as_str())).collect();
        let retain = |cells: Vec<Option<String>>| -> Row {
            cells.into_iter().zip(&keep).filter(|(_, k)| **k).map(|(c, _)| c).collect()
        };
        self.rows = std::mem::take(&mut self.rows).into_iter().map(retain).collect();
        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c)
            .collect();
    }

    /// Rows of `self` followed by rows of `other`. Columns are the union,
    /// `self`'s first; cells a side lacks are null.
    pub fn concat(mut self, other: RecordTable) -> RecordTable {
        let mapping: Vec<usize> = other.columns.iter().map(|c| self.add_column(c)).collect();
        for row in other.rows {
            let mut out = vec![None; self.columns.len()];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                out[idx] = cell;
            }
            self.rows.push(out);
        }
        self
    }

    /// Projects onto `order`, skipping names the table does not have.
    pub fn select(&self, order: &[&str]) -> RecordTable {
        let picked: Vec<(usize, &str)> = order
            .iter()
            .filter_map(|name| self.column_index(name).map(|idx| (idx, *name)))
            .collect();

        RecordTable {
            columns: picked.iter().map(|(_, name)| name.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| picked.iter().map(|(idx, _)| r[*idx].clone()).collect())
                .collect(),
        }
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut table = RecordTable { columns, rows: Vec::new() };
        for result in rdr.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|cell| if cell.is_empty() { None } else { Some(cell.to_string()) })
                .collect();
            table.push_row(row);
        }
        debug!("Loaded {} rows from {:?}", table.len(), path.as_ref());
        Ok(table)
    }

    /// Writes to a temporary sibling and renames it over `path`.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        {
            let mut wtr = csv::Writer::from_path(&tmp)?;
            if !self.columns.is_empty() {
                wtr.write_record(&self.columns)?;
            }
            for row in &self.rows {
                wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
            }
            wtr.flush()?;
        }
        fs::rename(&tmp, path)?;
        debug!("Wrote {} rows to {:?}", self.len(), path);
        Ok(())
    }
}

pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
