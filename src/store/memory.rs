use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{descending_rows, ColumnSpan, Row, StoreError, TableStore};

#[derive(Debug, Default)]
struct MemoryTable {
    id: i64,
    rows: Vec<Row>,
}

/// In-process table store. Cells are kept as literal strings.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a table; the first row is the header.
    pub fn with_table(mut self, name: &str, rows: Vec<Vec<&str>>) -> Self {
        let tables = self.tables.get_mut();
        let id = tables.len() as i64;
        tables.insert(
            name.to_string(),
            MemoryTable {
                id,
                rows: rows
                    .into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            },
        );
        self
    }

    pub async fn snapshot(&self, name: &str) -> Option<Vec<Row>> {
        self.tables.read().await.get(name).map(|t| t.rows.clone())
    }
}

fn slice_row(row: &[String], span: ColumnSpan) -> Row {
    let start = (span.first - 1) as usize;
    let end = (span.last as usize).min(row.len());
    if start >= end {
        return Vec::new();
    }
    let mut cells: Row = row[start..end].to_vec();
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn read_range(&self, table: &str, span: ColumnSpan) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let entry = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(entry.rows.iter().map(|r| slice_row(r, span)).collect())
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
        let mut tables = self.tables.write().await;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let row_idx = (row - 1) as usize;
        if entry.rows.len() <= row_idx {
            entry.rows.resize_with(row_idx + 1, Vec::new);
        }
        let cells = &mut entry.rows[row_idx];
        let start = (start_column - 1) as usize;
        if cells.len() < start + values.len() {
            cells.resize(start + values.len(), String::new());
        }
        for (offset, value) in values.into_iter().enumerate() {
            cells[start + offset] = value;
        }
        Ok(())
    }

    async fn append_rows(
        &self,
        table: &str,
        span: ColumnSpan,
        rows: Vec<Row>,
    ) -> Result<u32, StoreError> {
        let mut tables = self.tables.write().await;
        let next_id = tables.len() as i64;
        let entry = tables.entry(table.to_string()).or_insert_with(|| MemoryTable {
            id: next_id,
            rows: Vec::new(),
        });

        while entry.rows.last().is_some_and(|r| r.iter().all(|c| c.is_empty())) {
            entry.rows.pop();
        }
        let first_row = entry.rows.len() as u32 + 1;
        let lead = (span.first - 1) as usize;
        for values in rows {
            let mut cells = vec![String::new(); lead];
            cells.extend(values);
            entry.rows.push(cells);
        }
        Ok(first_row)
    }

    async fn delete_rows(&self, table: &str, rows: &[u32]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let ordered = descending_rows(rows);
        if let Some(&highest) = ordered.first() {
            if highest as usize > entry.rows.len() {
                return Err(StoreError::InvalidRow {
                    table: table.to_string(),
                    row: highest,
                });
            }
        }
        for row in ordered {
            entry.rows.remove((row - 1) as usize);
        }
        Ok(())
    }

    async fn table_id(&self, table: &str) -> Result<i64, StoreError> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.id)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let next_id = tables.len() as i64;
        tables.entry(table.to_string()).or_insert_with(|| MemoryTable {
            id: next_id,
            rows: Vec::new(),
        });
        Ok(())
    }
}
