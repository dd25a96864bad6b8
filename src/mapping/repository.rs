use log::debug;
use std::marker::PhantomData;

use super::{ColumnLayout, Located, MappedTable, RowRecord};
use crate::config::TableSettings;
use crate::shared::error::ApiError;
use crate::store::{ColumnSpan, RowRef, StoreError, TableStore};

/// Typed access to one configured table.
pub struct Repository<'a, T> {
    store: &'a dyn TableStore,
    name: &'a str,
    layout: ColumnLayout,
    span: ColumnSpan,
    _record: PhantomData<T>,
}

impl<'a, T: RowRecord> Repository<'a, T> {
    pub fn new(store: &'a dyn TableStore, settings: &'a TableSettings, span: ColumnSpan) -> Self {
        Self {
            store,
            name: &settings.name,
            layout: settings.layout,
            span,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &'a dyn TableStore {
        self.store
    }

    pub async fn load(&self) -> Result<MappedTable, StoreError> {
        MappedTable::load::<T>(self.store, self.name, self.span, self.layout).await
    }

    pub async fn list(&self) -> Result<Vec<Located<T>>, StoreError> {
        Ok(self.load().await?.records())
    }

    /// Appends `record` and returns its row number.
    pub async fn insert(&self, record: &T) -> Result<u32, StoreError> {
        let mut mapped = self.load().await?;
        mapped.append(self.store, std::slice::from_ref(record)).await
    }

    /// Loads the table and resolves `target` to a data row.
    pub async fn locate(&self, target: &RowRef) -> Result<(MappedTable, u32), ApiError> {
        let mapped = self.load().await?;
        let row = target.resolve(&mapped.table, &mapped.index, mapped.columns.column("id"))?;
        debug!("Resolved {target:?} in {} to row {row}", self.name);
        Ok((mapped, row))
    }

    /// Overwrites one field of the target row.
    pub async fn set_field(
        &self,
        target: &RowRef,
        key: &'static str,
        value: &str,
    ) -> Result<u32, ApiError> {
        let (mapped, row) = self.locate(target).await?;
        mapped.write_cell(self.store, row, key, value).await?;
        Ok(row)
    }

    /// Applies `change` to the stored record and writes its row back.
    pub async fn modify(
        &self,
        target: &RowRef,
        change: impl FnOnce(&mut T),
    ) -> Result<Located<T>, ApiError> {
        let (mapped, row) = self.locate(target).await?;
        let mut record: T = mapped
            .record(row)
            .ok_or_else(|| ApiError::NotFound(format!("No record at row {row}")))?;
        change(&mut record);
        mapped.update(self.store, row, &record).await?;
        Ok(Located {
            row_number: row,
            record,
        })
    }
}
