use log::info;

use super::types::{
    normalize_evaluation, SaveEvaluationRequest, SaveResultRequest, WeeklyResult, RESULT_SPAN,
};
use crate::mapping::{Located, Repository};
use crate::scope::{filter_by_scope, Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::store::RowRef;

pub fn repository(state: &AppState) -> Repository<'_, WeeklyResult> {
    Repository::new(state.store(), &state.tables().results, RESULT_SPAN)
}

/// Every result recorded for `week_id`, regardless of owner.
pub async fn week_results(
    state: &AppState,
    week_id: &str,
) -> Result<Vec<Located<WeeklyResult>>, ApiError> {
    let week_id = week_id.trim();
    let results = repository(state).list().await?;
    Ok(results
        .into_iter()
        .filter(|r| r.record.week_id == week_id)
        .collect())
}

pub async fn list_results(
    state: &AppState,
    identity: &str,
    week_id: &str,
    scope: Scope,
    role: Role,
) -> Result<Vec<Located<WeeklyResult>>, ApiError> {
    let results = week_results(state, week_id).await?;
    Ok(filter_by_scope(results, identity, scope, role))
}

pub async fn save_result(state: &AppState, req: SaveResultRequest) -> Result<u32, ApiError> {
    let owner = req
        .owner()
        .ok_or_else(|| ApiError::InvalidInput("userEmail is required".into()))?
        .trim()
        .to_lowercase();
    if req.week_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("weekId is required".into()));
    }
    let result = WeeklyResult {
        week_id: req.week_id.trim().to_string(),
        assigned_to: owner,
        expected_result: req.expected_result,
        evaluation: String::new(),
    };
    let row = repository(state).insert(&result).await?;
    info!("Saved result for {} in {} at row {row}", result.assigned_to, result.week_id);
    Ok(row)
}

/// Writes only the evaluation cell of the given row.
pub async fn save_evaluation(state: &AppState, req: SaveEvaluationRequest) -> Result<u32, ApiError> {
    let row_number = req
        .row_number
        .ok_or_else(|| ApiError::InvalidInput("rowNumber is required".into()))?;
    let evaluation = normalize_evaluation(&req.evaluation)
        .ok_or_else(|| ApiError::InvalidInput(format!("Invalid evaluation: {}", req.evaluation)))?;
    let row = repository(state)
        .set_field(&RowRef::by_row(row_number), "evaluation", evaluation)
        .await?;
    info!("Evaluation at row {row} set to {evaluation:?}");
    Ok(row)
}
