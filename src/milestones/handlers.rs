use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::storage;
use super::types::{CreateMilestoneRequest, CreateProjectRequest, Milestone, MilestoneQuery};
use crate::mapping::Located;
use crate::notify::{dispatch, AssignmentNotice};
use crate::progress::dates::today_iso;
use crate::scope::{Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{action_of, from_value, parse_json, unknown_action};

pub async fn handle_milestones_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MilestoneQuery>,
) -> Result<Json<Vec<Located<Milestone>>>, ApiError> {
    let milestones = storage::list_milestones(
        &state,
        query.email.as_deref().unwrap_or_default(),
        Scope::parse(query.scope.as_deref()),
        Role::parse(query.role.as_deref()),
    )
    .await?;
    Ok(Json(milestones))
}

pub fn milestone_notice(milestone: &Milestone) -> AssignmentNotice {
    let or_default = |value: &str, default: &str| {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };
    AssignmentNotice {
        description: format!("HITO ESTRATÉGICO: {}", milestone.nombre),
        due_date: milestone.fecha_fin.clone(),
        assigned_to: milestone.responsable.clone(),
        assigned_by: "Dirección (Admin)".to_string(),
        area: or_default(&milestone.area, "General"),
        project: or_default(&milestone.proyecto, "Cronograma Maestro"),
    }
}

async fn create(state: &AppState, req: CreateMilestoneRequest) -> Result<Response, ApiError> {
    let created = storage::create_milestone(state, req).await?;
    dispatch(state.notifier.clone(), milestone_notice(&created.record));
    Ok(Json(json!({
        "message": "Hito creado con éxito",
        "id": created.record.id,
        "rowNumber": created.row_number,
    }))
    .into_response())
}

/// A body without `action` is a milestone creation.
pub async fn handle_milestones_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let value = parse_json(&body)?;
    let action = action_of(&value).map(str::to_string);

    match action.as_deref() {
        None | Some("create") => create(&state, from_value(value)?).await,
        Some("createProject") => {
            let req: CreateProjectRequest = from_value(value)?;
            if req.proyecto.trim().is_empty() || req.area.trim().is_empty() {
                return Err(ApiError::InvalidInput("area and proyecto are required".into()));
            }
            create(&state, req.into_milestone_request(today_iso())).await
        }
        Some("updateStatus") => {
            let row = storage::update_estado(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Hito actualizado", "rowNumber": row })).into_response())
        }
        Some("updateFull") => {
            let updated = storage::update_milestone(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Hito actualizado", "milestone": updated })).into_response())
        }
        other => Err(unknown_action(other)),
    }
}
