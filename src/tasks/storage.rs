use log::info;

use super::types::{
    CreateTaskRequest, Task, UpdateStatusRequest, UpdateTaskRequest, STATUS_DONE, STATUS_PENDING,
    TASK_SPAN,
};
use crate::mapping::{Located, Repository};
use crate::progress::dates::today_iso;
use crate::scope::{filter_by_scope, Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::now_millis;

pub fn repository(state: &AppState) -> Repository<'_, Task> {
    Repository::new(state.store(), &state.tables().tasks, TASK_SPAN)
}

/// Canonical spelling of a task status, or `None` if it is not one.
pub fn normalize_status(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    [STATUS_PENDING, STATUS_DONE]
        .into_iter()
        .find(|s| s.eq_ignore_ascii_case(raw))
}

pub async fn list_tasks(
    state: &AppState,
    identity: &str,
    scope: Scope,
    role: Role,
) -> Result<Vec<Located<Task>>, ApiError> {
    let tasks = repository(state).list().await?;
    Ok(filter_by_scope(tasks, identity, scope, role))
}

pub async fn create_task(state: &AppState, req: CreateTaskRequest) -> Result<Located<Task>, ApiError> {
    if req.description.trim().is_empty() || req.assigned_to.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "description and assignedTo are required".into(),
        ));
    }

    let repo = repository(state);
    let mut mapped = repo.load().await?;
    let mut id = now_millis();
    while mapped.index.contains(&id.to_string()) {
        id += 1;
    }

    let task = Task {
        id: id.to_string(),
        description: req.description.trim().to_string(),
        assigned_to: req.assigned_to.trim().to_string(),
        start_date: req
            .start_date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(today_iso),
        due_date: req.due_date.trim().to_string(),
        status: STATUS_PENDING.to_string(),
        hito_id: req.hito_id.filter(|h| !h.trim().is_empty()),
        area: req.area.unwrap_or_default(),
        proyecto: req.proyecto.unwrap_or_default(),
        asignado_por: req.asignado_por.unwrap_or_default(),
        rescheduled_date: None,
    };

    let row_number = mapped.append(repo.store(), std::slice::from_ref(&task)).await?;
    info!("Created task {} for {} at row {row_number}", task.id, task.assigned_to);
    Ok(Located {
        row_number,
        record: task,
    })
}

pub async fn update_status(state: &AppState, req: UpdateStatusRequest) -> Result<u32, ApiError> {
    let status = normalize_status(&req.new_status)
        .ok_or_else(|| ApiError::InvalidInput(format!("Invalid status: {}", req.new_status)))?;
    let row = repository(state)
        .set_field(&req.target, "status", status)
        .await?;
    info!("Task at row {row} set to {status}");
    Ok(row)
}

pub async fn update_task(state: &AppState, req: UpdateTaskRequest) -> Result<Located<Task>, ApiError> {
    if let Some(status) = req.status.as_deref() {
        if normalize_status(status).is_none() {
            return Err(ApiError::InvalidInput(format!("Invalid status: {status}")));
        }
    }
    let target = req.target.clone();
    let updated = repository(state)
        .modify(&target, |task| {
            req.apply(task);
            if let Some(status) = normalize_status(&task.status) {
                task.status = status.to_string();
            }
        })
        .await?;
    info!("Task {} updated at row {}", updated.record.id, updated.row_number);
    Ok(updated)
}
