//! Local `.xlsx` workbook backend.
//!
//! The workbook is held in memory and written back to disk after every
//! mutation. All access goes through one mutex.

use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::{descending_rows, ColumnSpan, Row, StoreError, TableStore, ValueInput};

pub struct XlsxTableStore {
    path: PathBuf,
    value_input: ValueInput,
    workbook: Mutex<Spreadsheet>,
}

impl std::fmt::Debug for XlsxTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxTableStore")
            .field("path", &self.path)
            .field("value_input", &self.value_input)
            .finish_non_exhaustive()
    }
}

impl XlsxTableStore {
    /// Opens `path`, starting a new workbook when the file does not exist.
    pub fn open(path: impl AsRef<Path>, value_input: ValueInput) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let workbook = if path.exists() {
            info!("Opening workbook {}", path.display());
            umya_spreadsheet::reader::xlsx::read(&path)
                .map_err(|e| StoreError::Workbook(format!("Failed to read {}: {e}", path.display())))?
        } else {
            info!("Workbook {} not found, starting empty", path.display());
            umya_spreadsheet::new_file_empty_worksheet()
        };
        Ok(Self {
            path,
            value_input,
            workbook: Mutex::new(workbook),
        })
    }

    fn save(&self, workbook: &Spreadsheet) -> Result<(), StoreError> {
        umya_spreadsheet::writer::xlsx::write(workbook, &self.path)
            .map_err(|e| StoreError::Workbook(format!("Failed to write {}: {e}", self.path.display())))
    }

    fn set_cell(&self, sheet: &mut Worksheet, col: u32, row: u32, value: &str) {
        let cell = sheet.get_cell_mut((col, row));
        if self.value_input == ValueInput::Raw || value.is_empty() {
            cell.set_value_string(value);
        } else if let Ok(num) = value.parse::<f64>() {
            cell.set_value_number(num);
        } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            cell.set_value_bool(value.eq_ignore_ascii_case("true"));
        } else {
            cell.set_value_string(value);
        }
    }
}

fn sheet<'a>(workbook: &'a Spreadsheet, table: &str) -> Result<&'a Worksheet, StoreError> {
    workbook
        .get_sheet_by_name(table)
        .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
}

fn sheet_mut<'a>(workbook: &'a mut Spreadsheet, table: &str) -> Result<&'a mut Worksheet, StoreError> {
    workbook
        .get_sheet_by_name_mut(table)
        .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
}

fn row_cells(sheet: &Worksheet, row: u32, span: ColumnSpan) -> Row {
    let mut cells: Row = (span.first..=span.last)
        .map(|col| sheet.get_value((col, row)))
        .collect();
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Last row holding any value inside `span`, 0 when none.
fn last_populated_row(sheet: &Worksheet, span: ColumnSpan) -> u32 {
    (1..=sheet.get_highest_row())
        .rev()
        .find(|row| !row_cells(sheet, *row, span).is_empty())
        .unwrap_or(0)
}

#[async_trait]
impl TableStore for XlsxTableStore {
    async fn read_range(&self, table: &str, span: ColumnSpan) -> Result<Vec<Row>, StoreError> {
        let workbook = self.workbook.lock().await;
        let sheet = sheet(&workbook, table)?;
        let last = last_populated_row(sheet, span);
        Ok((1..=last).map(|row| row_cells(sheet, row, span)).collect())
    }

    async fn write_row(
        &self,
        table: &str,
        row: u32,
        start_column: u32,
        values: Row,
    ) -> Result<(), StoreError> {
        if row == 0 || start_column == 0 {
            return Err(StoreError::InvalidRow {
                table: table.to_string(),
                row,
            });
        }
        let mut workbook = self.workbook.lock().await;
        let sheet = sheet_mut(&mut workbook, table)?;
        for (offset, value) in values.iter().enumerate() {
            self.set_cell(sheet, start_column + offset as u32, row, value);
        }
        self.save(&workbook)
    }

    async fn append_rows(
        &self,
        table: &str,
        span: ColumnSpan,
        rows: Vec<Row>,
    ) -> Result<u32, StoreError> {
        let mut workbook = self.workbook.lock().await;
        let sheet = sheet_mut(&mut workbook, table)?;
        let first_row = last_populated_row(sheet, span) + 1;
        for (idx, values) in rows.iter().enumerate() {
            let row = first_row + idx as u32;
            for (offset, value) in values.iter().enumerate() {
                self.set_cell(sheet, span.first + offset as u32, row, value);
            }
        }
        debug!("Appended {} rows to {table} at row {first_row}", rows.len());
        self.save(&workbook)?;
        Ok(first_row)
    }

    async fn delete_rows(&self, table: &str, rows: &[u32]) -> Result<(), StoreError> {
        let ordered = descending_rows(rows);
        let mut workbook = self.workbook.lock().await;
        let sheet = sheet_mut(&mut workbook, table)?;
        if let Some(&highest) = ordered.first() {
            if highest > sheet.get_highest_row() {
                return Err(StoreError::InvalidRow {
                    table: table.to_string(),
                    row: highest,
                });
            }
        }
        for row in &ordered {
            sheet.remove_row(row, &1);
        }
        self.save(&workbook)
    }

    async fn table_id(&self, table: &str) -> Result<i64, StoreError> {
        let workbook = self.workbook.lock().await;
        workbook
            .get_sheet_collection()
            .iter()
            .position(|s| s.get_name() == table)
            .map(|idx| idx as i64)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let mut workbook = self.workbook.lock().await;
        if workbook.get_sheet_by_name(table).is_some() {
            return Ok(());
        }
        workbook
            .new_sheet(table)
            .map_err(|e| StoreError::Workbook(format!("Failed to add sheet {table}: {e}")))?;
        info!("Created sheet {table} in {}", self.path.display());
        self.save(&workbook)
    }
}
