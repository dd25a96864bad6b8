use log::{debug, info, warn};
use std::collections::HashMap;

use super::types::{
    ChecklistActivity, ChecklistItem, ChecklistLogEntry, SaveChecklistRequest, ACTIVITY_SPAN,
    LOG_SPAN,
};
use crate::mapping::{MappedTable, RowRecord};
use crate::scope::same_identity;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// Activities marked for `email`: its column is the header cell equal to the
/// address, and any non-blank cell below it is a mark.
pub async fn assigned_activities(
    state: &AppState,
    email: &str,
) -> Result<Vec<ChecklistActivity>, ApiError> {
    let settings = &state.tables().checklist;
    let mapped = MappedTable::load::<ChecklistActivity>(
        state.store(),
        &settings.name,
        ACTIVITY_SPAN,
        settings.layout,
    )
    .await?;

    let email = email.trim();
    let Some(column) = mapped
        .table
        .header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(email))
    else {
        warn!("No checklist column for {email}");
        return Ok(Vec::new());
    };

    Ok(mapped
        .table
        .data_rows()
        .filter(|row| !row.cell(column).trim().is_empty())
        .map(|row| ChecklistActivity::from_row(&mapped.columns, row))
        .collect())
}

async fn load_log(state: &AppState) -> Result<MappedTable, ApiError> {
    let settings = &state.tables().checklist_log;
    let mapped = MappedTable::load::<ChecklistLogEntry>(
        state.store(),
        &settings.name,
        LOG_SPAN,
        settings.layout,
    )
    .await?;
    Ok(mapped)
}

fn entries_for<'a>(
    mapped: &'a MappedTable,
    email: &'a str,
    date_id: &'a str,
) -> impl Iterator<Item = (u32, ChecklistLogEntry)> + 'a {
    mapped
        .records::<ChecklistLogEntry>()
        .into_iter()
        .filter(move |e| e.record.date_id == date_id && same_identity(email, &e.record.email))
        .map(|e| (e.row_number, e.record))
}

pub async fn load_checklist(
    state: &AppState,
    email: &str,
    date_id: &str,
) -> Result<Vec<ChecklistItem>, ApiError> {
    let activities = assigned_activities(state, email).await?;
    if activities.is_empty() {
        return Ok(Vec::new());
    }

    let log = load_log(state).await?;
    let progress: HashMap<String, (bool, bool)> = entries_for(&log, email, date_id.trim())
        .map(|(_, e)| (e.activity_id, (e.is_planned, e.is_completed)))
        .collect();

    Ok(activities
        .into_iter()
        .map(|activity| {
            let (is_planned, is_completed) =
                progress.get(&activity.id).copied().unwrap_or_default();
            ChecklistItem {
                activity,
                is_planned,
                is_completed,
            }
        })
        .collect())
}

/// Replaces the saved progress of one person for one day.
///
/// Rows are deleted by number, so every save against the log table runs
/// under one lock from the read to the append. The old rows are deleted in
/// one batch before the new set is appended; a failure at either step is a
/// `PartialOperation`.
pub async fn save_checklist(state: &AppState, req: SaveChecklistRequest) -> Result<usize, ApiError> {
    let email = req.email.trim().to_lowercase();
    let date_id = req.date_id.trim().to_string();
    if email.is_empty() || date_id.is_empty() {
        return Err(ApiError::InvalidInput("email and dateId are required".into()));
    }

    let _guard = state
        .checklist_locks
        .lock(&state.tables().checklist_log.name)
        .await;

    let mut log = load_log(state).await?;
    let stale: Vec<u32> = entries_for(&log, &email, &date_id).map(|(row, _)| row).collect();

    if let Err(e) = log.delete_rows(state.store(), &stale).await {
        return Err(ApiError::PartialOperation(format!(
            "Could not clear checklist for {email} on {date_id}: {e}"
        )));
    }
    debug!("Cleared {} checklist rows for {email} on {date_id}", stale.len());

    let entries: Vec<ChecklistLogEntry> = req
        .progress
        .into_iter()
        .filter_map(|item| {
            let activity_id = item.activity_id?.trim().to_string();
            (!activity_id.is_empty()).then(|| ChecklistLogEntry {
                date_id: date_id.clone(),
                email: email.clone(),
                activity_id,
                is_planned: item.is_planned,
                is_completed: item.is_completed,
            })
        })
        .collect();

    if !entries.is_empty() {
        if let Err(e) = log.append(state.store(), &entries).await {
            return Err(ApiError::PartialOperation(format!(
                "Cleared checklist for {email} on {date_id} but could not write it back: {e}"
            )));
        }
    }
    info!("Saved {} checklist entries for {email} on {date_id}", entries.len());
    Ok(entries.len())
}
