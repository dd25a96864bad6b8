use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::storage;
use super::types::{ResultQuery, WeeklyResult};
use crate::mapping::Located;
use crate::scope::{Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{action_of, from_value, parse_json, required, unknown_action};

pub async fn handle_results_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<Vec<Located<WeeklyResult>>>, ApiError> {
    let email = required(query.email.as_deref(), "email")?;
    let week_id = required(query.week_id.as_deref(), "weekId")?;
    let results = storage::list_results(
        &state,
        email,
        week_id,
        Scope::parse(query.scope.as_deref()),
        Role::parse(query.role.as_deref()),
    )
    .await?;
    Ok(Json(results))
}

pub async fn handle_results_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let value = parse_json(&body)?;
    let action = action_of(&value).map(str::to_string);

    match action.as_deref() {
        Some("saveResult") => {
            let row = storage::save_result(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Resultado guardado correctamente.", "rowNumber": row })))
        }
        Some("saveEvaluation") => {
            let row = storage::save_evaluation(&state, from_value(value)?).await?;
            Ok(Json(json!({ "message": "Evaluación guardada.", "rowNumber": row })))
        }
        other => Err(unknown_action(other)),
    }
}
