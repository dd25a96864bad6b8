use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::storage;
use super::types::{ChecklistItem, ChecklistQuery, SaveChecklistRequest};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{message, parse_body, required};

pub async fn handle_checklist_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChecklistQuery>,
) -> Result<Json<Vec<ChecklistItem>>, ApiError> {
    let email = required(query.email.as_deref(), "email")?;
    let date_id = required(query.date_id.as_deref(), "dateId")?;
    let items = storage::load_checklist(&state, email, date_id).await?;
    Ok(Json(items))
}

pub async fn handle_checklist_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: SaveChecklistRequest = parse_body(&body)?;
    storage::save_checklist(&state, req).await?;
    Ok(message("Checklist actualizado"))
}
