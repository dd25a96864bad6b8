use log::debug;

use super::{ColumnSpan, Row, StoreError, TableStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based physical row number.
    pub number: u32,
    pub cells: Row,
}

impl TableRow {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// A fully loaded table: header plus data rows, each padded to the span width.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub span: ColumnSpan,
    pub header: Row,
    pub rows: Vec<TableRow>,
    /// The sheet did not exist when the table was loaded.
    pub missing: bool,
}

impl Table {
    pub fn empty(name: &str, span: ColumnSpan) -> Self {
        Self {
            name: name.to_string(),
            span,
            header: vec![String::new(); span.width()],
            rows: Vec::new(),
            missing: false,
        }
    }

    pub fn from_rows(name: &str, span: ColumnSpan, raw: Vec<Row>) -> Self {
        let width = span.width();
        let mut iter = raw.into_iter().map(|mut r| {
            r.resize(width, String::new());
            r
        });
        let header = iter.next().unwrap_or_else(|| vec![String::new(); width]);
        let rows = iter
            .enumerate()
            .map(|(idx, cells)| TableRow {
                number: idx as u32 + 2,
                cells,
            })
            .collect();
        Self {
            name: name.to_string(),
            span,
            header,
            rows,
            missing: false,
        }
    }

    /// Loads `name`; a table that does not exist yet loads as empty.
    pub async fn load(
        store: &dyn TableStore,
        name: &str,
        span: ColumnSpan,
    ) -> Result<Self, StoreError> {
        match store.read_range(name, span).await {
            Ok(raw) => Ok(Self::from_rows(name, span, raw)),
            Err(StoreError::TableNotFound(_)) => {
                debug!("Table {name} does not exist yet, treating as empty");
                let mut table = Self::empty(name, span);
                table.missing = true;
                Ok(table)
            }
            Err(e) => Err(e),
        }
    }

    pub fn has_header(&self) -> bool {
        self.header.iter().any(|h| !h.trim().is_empty())
    }

    /// No header and no data at all.
    pub fn is_empty(&self) -> bool {
        !self.has_header() && self.rows.iter().all(TableRow::is_blank)
    }

    pub fn row(&self, number: u32) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.number == number)
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| !r.is_blank())
    }

    /// Appends `rows`, first creating the sheet and writing `header` when the
    /// table is completely empty. Returns the first data row number.
    pub async fn append_with_header(
        &self,
        store: &dyn TableStore,
        header: &[&str],
        rows: Vec<Row>,
    ) -> Result<u32, StoreError> {
        if self.missing {
            store.create_table(&self.name).await?;
        }
        if self.is_empty() {
            debug!("Writing header row for empty table {}", self.name);
            let header_row = header.iter().map(|h| h.to_string()).collect();
            store
                .append_rows(&self.name, self.span, vec![header_row])
                .await?;
        }
        store.append_rows(&self.name, self.span, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTableStore;

    #[test]
    fn test_from_rows_pads_short_rows_and_numbers_from_two() {
        let table = Table::from_rows(
            "T",
            ColumnSpan::new(1, 3),
            vec![
                vec!["a".into(), "b".into(), "c".into()],
                vec!["1".into()],
                vec![],
                vec!["3".into(), "x".into()],
            ],
        );
        assert_eq!(table.rows[0].cells, vec!["1", "", ""]);
        assert_eq!(table.rows[2].number, 4);
        assert_eq!(table.data_rows().count(), 2);
        assert_eq!(table.row(4).map(|r| r.cell(1)), Some("x"));
        assert_eq!(table.rows[0].cell(7), "");
    }

    #[tokio::test]
    async fn test_load_missing_table_is_empty() {
        let store = MemoryTableStore::new();
        let table = Table::load(&store, "Agenda", ColumnSpan::new(1, 5)).await.unwrap();
        assert!(table.missing);
        assert!(table.is_empty());
        assert!(table.rows.is_empty());
    }

    #[tokio::test]
    async fn test_append_with_header_on_empty_table() {
        let store = MemoryTableStore::new();
        let span = ColumnSpan::new(1, 2);
        let table = Table::load(&store, "Agenda", span).await.unwrap();
        let first = table
            .append_with_header(&store, &["Fecha", "Moderador"], vec![vec!["2024-05-01".into(), "ana@x.com".into()]])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let reloaded = Table::load(&store, "Agenda", span).await.unwrap();
        assert_eq!(reloaded.header, vec!["Fecha", "Moderador"]);
        assert_eq!(reloaded.rows.len(), 1);

        reloaded
            .append_with_header(&store, &["Fecha", "Moderador"], vec![vec!["2024-05-02".into()]])
            .await
            .unwrap();
        let rows = store.snapshot("Agenda").await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}
