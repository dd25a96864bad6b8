use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::storage;
use super::types::{Task, TaskQuery};
use crate::mapping::Located;
use crate::notify::{dispatch, AssignmentNotice};
use crate::scope::{Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{action_of, from_value, parse_json, required, unknown_action};

pub async fn handle_tasks_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Located<Task>>>, ApiError> {
    let email = required(query.email.as_deref(), "email")?;
    let tasks = storage::list_tasks(
        &state,
        email,
        Scope::parse(query.scope.as_deref()),
        Role::parse(query.role.as_deref()),
    )
    .await?;
    Ok(Json(tasks))
}

pub fn assignment_notice(task: &Task) -> AssignmentNotice {
    AssignmentNotice {
        description: task.description.clone(),
        due_date: task.effective_due_date().to_string(),
        assigned_to: task.assigned_to.clone(),
        assigned_by: task.asignado_por.clone(),
        area: task.area.clone(),
        project: task.proyecto.clone(),
    }
}

pub async fn handle_tasks_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let value = parse_json(&body)?;
    let action = action_of(&value).map(str::to_string);

    match action.as_deref() {
        Some("create") => {
            let created = storage::create_task(&state, from_value(value)?).await?;
            dispatch(state.notifier.clone(), assignment_notice(&created.record));
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": "Tarea creada",
                    "id": created.record.id,
                    "rowNumber": created.row_number,
                })),
            )
                .into_response())
        }
        Some("updateStatus") => {
            let row = storage::update_status(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Tarea actualizada", "rowNumber": row })).into_response())
        }
        Some("updateFull") => {
            let updated = storage::update_task(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Tarea actualizada", "task": updated })).into_response())
        }
        other => Err(unknown_action(other)),
    }
}
