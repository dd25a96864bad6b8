//! Table Store
//!
//! Row-addressed access to named tables (sheets). Row 1 of every table is the
//! header row; data rows are addressed by their 1-based physical position.

pub mod a1;
pub mod index;
pub mod memory;
pub mod sheets;
pub mod table;
#[cfg(feature = "xlsx")]
pub mod xlsx;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use index::{LocateError, RowIndex, RowRef};
pub use memory::MemoryTableStore;
pub use sheets::SheetsTableStore;
pub use table::{Table, TableRow};
#[cfg(feature = "xlsx")]
pub use xlsx::XlsxTableStore;

pub type Row = Vec<String>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Row {row} does not exist in table {table}")]
    InvalidRow { table: String, row: u32 },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workbook error: {0}")]
    Workbook(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound(_))
    }
}

/// Inclusive, 1-based column span such as `A:E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub first: u32,
    pub last: u32,
}

impl ColumnSpan {
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    pub const fn width(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn a1(&self, table: &str) -> String {
        a1::columns_range(table, self.first, self.last)
    }
}

/// How written values are interpreted by the backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueInput {
    /// Values are parsed as if typed by a user: `007` may become the number 7.
    #[default]
    UserEntered,
    /// Values are stored as literal strings.
    Raw,
}

impl ValueInput {
    pub fn from_literal_flag(literal_values: bool) -> Self {
        if literal_values {
            Self::Raw
        } else {
            Self::UserEntered
        }
    }

    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::UserEntered => "USER_ENTERED",
            Self::Raw => "RAW",
        }
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads every row of `table` within `span`, header included, in storage order.
    async fn read_range(&self, table: &str, span: ColumnSpan) -> Result<Vec<Row>, StoreError>;

    /// Overwrites `values.len()` cells of `row` starting at `start_column`.
    async fn write_row(
        &self,
        table: &str,
        row: u32,
        start_column: u32,
        values: Row,
    ) -> Result<(), StoreError>;

    /// Appends rows after the last populated row and returns the row number of
    /// the first appended row.
    async fn append_rows(
        &self,
        table: &str,
        span: ColumnSpan,
        rows: Vec<Row>,
    ) -> Result<u32, StoreError>;

    /// Removes rows and shifts the following rows up. Implementations must
    /// apply the deletions from the highest index to the lowest.
    async fn delete_rows(&self, table: &str, rows: &[u32]) -> Result<(), StoreError>;

    async fn table_id(&self, table: &str) -> Result<i64, StoreError>;

    async fn create_table(&self, table: &str) -> Result<(), StoreError>;
}

/// Row numbers sorted from highest to lowest without duplicates or row 0.
pub fn descending_rows(rows: &[u32]) -> Vec<u32> {
    let mut sorted: Vec<u32> = rows.iter().copied().filter(|r| *r > 0).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}
