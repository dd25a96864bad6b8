use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::storage;
use super::types::{AgendaEntry, AgendaQuery};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{message, parse_body, required};

pub async fn handle_agenda_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<AgendaEntry>, ApiError> {
    let date = required(query.date.as_deref(), "date")?;
    Ok(Json(storage::get_agenda(&state, date).await?))
}

pub async fn handle_agenda_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let entry: AgendaEntry = parse_body(&body)?;
    storage::save_agenda(&state, entry).await?;
    Ok(message("Agenda guardada correctamente."))
}
