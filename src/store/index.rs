use log::warn;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use super::table::Table;

/// Stable record id → physical row number, rebuilt on every table load.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    by_id: HashMap<String, u32>,
}

impl RowIndex {
    pub fn build(table: &Table, id_column: Option<usize>) -> Self {
        let mut by_id = HashMap::new();
        let Some(col) = id_column else {
            return Self { by_id };
        };
        for row in table.data_rows() {
            let id = row.cell(col).trim();
            if id.is_empty() {
                continue;
            }
            if by_id.contains_key(id) {
                warn!(
                    "Duplicate id {id} in {} at row {}, keeping the first occurrence",
                    table.name, row.number
                );
                continue;
            }
            by_id.insert(id.to_string(), row.number);
        }
        Self { by_id }
    }

    pub fn locate(&self, id: &str) -> Option<u32> {
        self.by_id.get(id.trim()).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id.trim())
    }

    pub fn insert(&mut self, id: &str, row: u32) {
        self.by_id.insert(id.trim().to_string(), row);
    }

    /// Drops entries for deleted rows and shifts the rows below them up.
    pub fn remove_rows(&mut self, deleted: &[u32]) {
        self.by_id.retain(|_, row| !deleted.contains(row));
        for row in self.by_id.values_mut() {
            let shift = deleted.iter().filter(|d| **d < *row).count() as u32;
            *row -= shift;
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// How a client designates an existing record: by its row number, its id, or both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRef {
    #[serde(default, deserialize_with = "row_number")]
    pub row_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("A rowNumber or id is required")]
    Missing,
    #[error("Row {0} is not a data row")]
    InvalidRow(u32),
    #[error("No record at row {0}")]
    RowNotFound(u32),
    #[error("No record with id {0}")]
    IdNotFound(String),
    #[error("Row {row} holds id {found}, expected {expected}")]
    Mismatch {
        row: u32,
        expected: String,
        found: String,
    },
}

impl RowRef {
    pub fn by_row(row: u32) -> Self {
        Self {
            row_number: Some(row),
            id: None,
        }
    }

    pub fn by_id(id: &str) -> Self {
        Self {
            row_number: None,
            id: Some(id.to_string()),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Resolves to a physical row. With both handles present the id stored at
    /// the row must match; with a row number alone the last writer wins.
    pub fn resolve(
        &self,
        table: &Table,
        index: &RowIndex,
        id_column: Option<usize>,
    ) -> Result<u32, LocateError> {
        match (self.row_number, self.id()) {
            (Some(row), id) => {
                if row < 2 {
                    return Err(LocateError::InvalidRow(row));
                }
                let stored = table.row(row).ok_or(LocateError::RowNotFound(row))?;
                if let (Some(expected), Some(col)) = (id, id_column) {
                    let found = stored.cell(col).trim();
                    if found != expected {
                        return Err(LocateError::Mismatch {
                            row,
                            expected: expected.to_string(),
                            found: found.to_string(),
                        });
                    }
                }
                Ok(row)
            }
            (None, Some(id)) => index
                .locate(id)
                .ok_or_else(|| LocateError::IdNotFound(id.to_string())),
            (None, None) => Err(LocateError::Missing),
        }
    }
}

/// Accepts a row number sent either as a JSON number or as a numeric string.
pub fn row_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid rowNumber {n}"))),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "null" {
                return Ok(None);
            }
            trimmed
                .parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid rowNumber {trimmed}")))
        }
        Some(other) => Err(D::Error::custom(format!("invalid rowNumber {other}"))),
    }
}

/// Accepts an identifier sent either as a string or as a bare number.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("invalid id {other}"))),
    }
}
