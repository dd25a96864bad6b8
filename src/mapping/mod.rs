//! Row ↔ Record Mapping
//!
//! Each entity declares its fields once. A table's columns are resolved per
//! load, either from fixed legacy offsets or by matching the header row.

pub mod repository;

use serde::{Deserialize, Serialize};

use crate::store::{ColumnSpan, Row, RowIndex, StoreError, Table, TableRow, TableStore};

pub use repository::Repository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Columns sit at fixed positions regardless of the header.
    LegacyFixedOffset,
    /// Columns are located by header text; canonical order when no header exists.
    #[default]
    HeaderMatched,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    /// Header written when the table is created.
    pub header: &'static str,
    /// Lowercase, accent-free header names this field answers to.
    pub aliases: &'static [&'static str],
    /// Position in the legacy fixed layout, if the field exists there.
    pub legacy: Option<usize>,
}

impl FieldSpec {
    pub const fn new(
        key: &'static str,
        header: &'static str,
        aliases: &'static [&'static str],
        legacy: Option<usize>,
    ) -> Self {
        Self {
            key,
            header,
            aliases,
            legacy,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Table {table} has no column for {field}")]
    UnmappedField { table: String, field: &'static str },
}

/// Lowercases and strips Spanish diacritics so `Área` matches `area`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Field → 0-based column resolution for one loaded table.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    table: String,
    fields: &'static [FieldSpec],
    columns: Vec<Option<usize>>,
    width: usize,
}

impl ColumnMap {
    pub fn resolve(
        table: &str,
        fields: &'static [FieldSpec],
        layout: ColumnLayout,
        header: &[String],
        width: usize,
    ) -> Self {
        let has_header = header.iter().any(|h| !h.trim().is_empty());
        let columns = match layout {
            ColumnLayout::LegacyFixedOffset => fields
                .iter()
                .map(|f| f.legacy.filter(|c| *c < width))
                .collect(),
            ColumnLayout::HeaderMatched if !has_header => (0..fields.len())
                .map(|idx| Some(idx).filter(|c| *c < width))
                .collect(),
            ColumnLayout::HeaderMatched => match_header(fields, header, width),
        };
        Self {
            table: table.to_string(),
            fields,
            columns,
            width,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn column(&self, key: &str) -> Option<usize> {
        self.position(key).and_then(|idx| self.columns[idx])
    }

    pub fn require(&self, key: &'static str) -> Result<usize, MappingError> {
        self.column(key).ok_or_else(|| MappingError::UnmappedField {
            table: self.table.clone(),
            field: key,
        })
    }

    pub fn read<'a>(&self, row: &'a TableRow, key: &str) -> &'a str {
        self.column(key).map(|c| row.cell(c)).unwrap_or("")
    }

    /// Sets `key`'s cell; a field without a column is silently not written.
    pub fn write(&self, cells: &mut Row, key: &str, value: &str) {
        if let Some(col) = self.column(key) {
            if cells.len() < self.width {
                cells.resize(self.width, String::new());
            }
            cells[col] = value.to_string();
        }
    }

    pub fn blank_row(&self) -> Row {
        vec![String::new(); self.width]
    }

    /// Header row in canonical field order, clipped to the span.
    pub fn canonical_header(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|f| f.header)
            .take(self.width)
            .collect()
    }

    /// Header row for a freshly created table under the given layout.
    pub fn creation_header(&self) -> Vec<&'static str> {
        let mut header = vec![""; self.width];
        for (field, col) in self.fields.iter().zip(&self.columns) {
            if let Some(col) = col {
                header[*col] = field.header;
            }
        }
        header
    }
}

fn match_header(fields: &[FieldSpec], header: &[String], width: usize) -> Vec<Option<usize>> {
    let normalized: Vec<String> = header.iter().take(width).map(|h| normalize_header(h)).collect();
    let mut claimed = vec![false; normalized.len()];
    let mut columns = vec![None; fields.len()];

    for (idx, field) in fields.iter().enumerate() {
        let hit = field.aliases.iter().find_map(|alias| {
            normalized
                .iter()
                .enumerate()
                .position(|(c, h)| !claimed[c] && h == alias)
        });
        if let Some(col) = hit {
            claimed[col] = true;
            columns[idx] = Some(col);
        }
    }

    for (idx, field) in fields.iter().enumerate() {
        if columns[idx].is_some() {
            continue;
        }
        let hit = field.aliases.iter().find_map(|alias| {
            normalized
                .iter()
                .enumerate()
                .position(|(c, h)| !claimed[c] && !h.is_empty() && h.contains(alias))
        });
        if let Some(col) = hit {
            claimed[col] = true;
            columns[idx] = Some(col);
        }
    }
    columns
}

/// An entity stored one per row.
pub trait RowRecord: Sized {
    const FIELDS: &'static [FieldSpec];

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self;

    /// Writes every stored field into `cells`, leaving other columns untouched.
    fn write_into(&self, map: &ColumnMap, cells: &mut Row);

    /// Stable identifier, for records that have one.
    fn record_id(&self) -> Option<&str> {
        None
    }

    fn to_row(&self, map: &ColumnMap) -> Row {
        let mut cells = map.blank_row();
        self.write_into(map, &mut cells);
        cells
    }
}

/// A decoded record together with its physical row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Located<T> {
    pub row_number: u32,
    #[serde(flatten)]
    pub record: T,
}

/// A loaded table with its columns resolved for `T`.
#[derive(Debug, Clone)]
pub struct MappedTable {
    pub table: Table,
    pub columns: ColumnMap,
    pub index: RowIndex,
}

impl MappedTable {
    pub async fn load<T: RowRecord>(
        store: &dyn TableStore,
        name: &str,
        span: ColumnSpan,
        layout: ColumnLayout,
    ) -> Result<Self, StoreError> {
        let table = Table::load(store, name, span).await?;
        let columns = ColumnMap::resolve(name, T::FIELDS, layout, &table.header, span.width());
        let index = RowIndex::build(&table, columns.column("id"));
        Ok(Self {
            table,
            columns,
            index,
        })
    }

    pub fn records<T: RowRecord>(&self) -> Vec<Located<T>> {
        self.table
            .data_rows()
            .map(|row| Located {
                row_number: row.number,
                record: T::from_row(&self.columns, row),
            })
            .collect()
    }

    pub fn record<T: RowRecord>(&self, row: u32) -> Option<T> {
        self.table.row(row).map(|r| T::from_row(&self.columns, r))
    }

    /// Appends records, writing the header first on a brand new table.
    pub async fn append<T: RowRecord>(
        &mut self,
        store: &dyn TableStore,
        records: &[T],
    ) -> Result<u32, StoreError> {
        let rows = records.iter().map(|r| r.to_row(&self.columns)).collect();
        let header = self.columns.creation_header();
        let first = self
            .table
            .append_with_header(store, &header, rows)
            .await?;
        if self.table.is_empty() {
            self.table.header = header.iter().map(|h| h.to_string()).collect();
        }
        self.table.missing = false;
        for (offset, record) in records.iter().enumerate() {
            if let Some(id) = record.record_id() {
                self.index.insert(id, first + offset as u32);
            }
        }
        Ok(first)
    }

    /// Deletes rows in one batch and keeps the id index in step.
    pub async fn delete_rows(
        &mut self,
        store: &dyn TableStore,
        rows: &[u32],
    ) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        store.delete_rows(&self.table.name, rows).await?;
        self.index.remove_rows(rows);
        Ok(())
    }

    /// Rewrites the stored fields of `row`, keeping cells of unmapped columns.
    pub async fn update<T: RowRecord>(
        &self,
        store: &dyn TableStore,
        row: u32,
        record: &T,
    ) -> Result<(), StoreError> {
        let mut cells = self
            .table
            .row(row)
            .map(|r| r.cells.clone())
            .unwrap_or_else(|| self.columns.blank_row());
        record.write_into(&self.columns, &mut cells);
        store
            .write_row(&self.table.name, row, self.table.span.first, cells)
            .await
    }

    /// Overwrites the single cell holding `key` in `row`.
    pub async fn write_cell(
        &self,
        store: &dyn TableStore,
        row: u32,
        key: &'static str,
        value: &str,
    ) -> Result<(), crate::shared::error::ApiError> {
        let col = self.columns.require(key)?;
        store
            .write_row(
                &self.table.name,
                row,
                self.table.span.first + col as u32,
                vec![value.to_string()],
            )
            .await?;
        Ok(())
    }
}
