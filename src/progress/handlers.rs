use axum::{
    extract::{Query, State},
    Json,
};
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use super::dates::{current_week_id, today};
use super::{aggregate, team_report, ProgressReport, TeamReport};
use crate::milestones::storage::list_milestones;
use crate::results::storage::week_results;
use crate::scope::{filter_by_scope, Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::tasks::storage::repository as task_repository;
use crate::tasks::Task;
use crate::users::list_users;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub email: Option<String>,
    pub scope: Option<String>,
    pub role: Option<String>,
    pub week_id: Option<String>,
}

async fn all_tasks(state: &AppState) -> Result<Vec<Task>, ApiError> {
    Ok(task_repository(state)
        .list()
        .await?
        .into_iter()
        .map(|t| t.record)
        .collect())
}

/// Milestones visible to the caller with their completion. Milestone
/// figures count every linked task; the global figure only the caller's
/// tasks unless an Admin asks for everything.
pub async fn handle_progress_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ProgressReport>, ApiError> {
    let email = query.email.as_deref().unwrap_or_default();
    let scope = Scope::parse(query.scope.as_deref());
    let role = Role::parse(query.role.as_deref());

    let milestones = list_milestones(&state, email, scope, role).await?;
    let tasks = all_tasks(&state).await?;
    let scoped = filter_by_scope(tasks.clone(), email, scope, role);
    debug!(
        "Progress for {email}: {} milestones, {} of {} tasks in scope",
        milestones.len(),
        scoped.len(),
        tasks.len()
    );
    Ok(Json(aggregate(milestones, &tasks, &scoped)))
}

pub async fn handle_team_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<TeamReport>, ApiError> {
    if !Role::parse(query.role.as_deref()).is_admin() {
        return Err(ApiError::Forbidden("The team dashboard is for Admin users".into()));
    }
    let week_id = query
        .week_id
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .unwrap_or_else(current_week_id);

    let users = list_users(&state).await?;
    let tasks = all_tasks(&state).await?;
    let results = week_results(&state, &week_id).await?;
    Ok(Json(team_report(&week_id, &users, &tasks, &results, today())))
}
