use log::info;

use super::types::{AgendaEntry, AGENDA_SPAN};
use crate::mapping::{Located, MappedTable, Repository};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

pub fn repository(state: &AppState) -> Repository<'_, AgendaEntry> {
    Repository::new(state.store(), &state.tables().agenda, AGENDA_SPAN)
}

fn find_date(mapped: &MappedTable, date: &str) -> Option<Located<AgendaEntry>> {
    mapped
        .records::<AgendaEntry>()
        .into_iter()
        .find(|e| e.record.date == date)
}

pub async fn get_agenda(state: &AppState, date: &str) -> Result<AgendaEntry, ApiError> {
    let mapped = repository(state).load().await?;
    find_date(&mapped, date.trim())
        .map(|e| e.record)
        .ok_or_else(|| ApiError::NotFound(format!("No se encontró agenda para {}", date.trim())))
}

/// Overwrites the entry for the same date or appends a new one.
pub async fn save_agenda(state: &AppState, mut entry: AgendaEntry) -> Result<u32, ApiError> {
    entry.date = entry.date.trim().to_string();
    if entry.date.is_empty() {
        return Err(ApiError::InvalidInput("date is required".into()));
    }

    let repo = repository(state);
    let mut mapped = repo.load().await?;
    let row = match find_date(&mapped, &entry.date) {
        Some(existing) => {
            mapped.update(repo.store(), existing.row_number, &entry).await?;
            existing.row_number
        }
        None => {
            mapped
                .append(repo.store(), std::slice::from_ref(&entry))
                .await?
        }
    };
    info!("Saved agenda for {} at row {row}", entry.date);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::test_context;
    use crate::store::MemoryTableStore;

    fn entry(date: &str, topics: &str) -> AgendaEntry {
        AgendaEntry {
            date: date.into(),
            moderator: "ana@x.com".into(),
            topics: topics.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_save_writes_header() {
        let ctx = test_context(MemoryTableStore::new());
        let row = save_agenda(&ctx.state, entry("2024-05-15", "Q2")).await.unwrap();
        assert_eq!(row, 2);

        let rows = ctx.store.snapshot("Agenda").await.unwrap();
        assert_eq!(rows[0], ["Fecha", "Moderador", "Temas", "Asistentes", "Conclusiones"]);
        assert_eq!(rows[1][2], "Q2");
    }

    #[tokio::test]
    async fn test_save_upserts_by_date() {
        let ctx = test_context(MemoryTableStore::new());
        save_agenda(&ctx.state, entry("2024-05-15", "Q2")).await.unwrap();
        save_agenda(&ctx.state, entry("2024-05-16", "Q3")).await.unwrap();
        let row = save_agenda(&ctx.state, entry("2024-05-15", "Q2 revisado")).await.unwrap();
        assert_eq!(row, 2);

        let rows = ctx.store.snapshot("Agenda").await.unwrap();
        assert_eq!(rows.len(), 3);
        let found = get_agenda(&ctx.state, "2024-05-15").await.unwrap();
        assert_eq!(found.topics, "Q2 revisado");
    }

    #[tokio::test]
    async fn test_unknown_date_is_not_found() {
        let ctx = test_context(MemoryTableStore::new());
        assert!(matches!(
            get_agenda(&ctx.state, "2024-01-01").await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }
}
