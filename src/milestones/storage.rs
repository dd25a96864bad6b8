use log::info;

use super::types::{
    CreateMilestoneRequest, Milestone, UpdateEstadoRequest, UpdateMilestoneRequest,
    ESTADO_IN_PROGRESS, MILESTONE_SPAN,
};
use crate::mapping::{Located, Repository};
use crate::progress::dates::today_iso;
use crate::scope::{filter_by_scope, Role, Scope};
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::now_millis;
use crate::store::RowIndex;

pub fn repository(state: &AppState) -> Repository<'_, Milestone> {
    Repository::new(state.store(), &state.tables().milestones, MILESTONE_SPAN)
}

/// `H-` plus the last four digits of `millis`, or the full timestamp when
/// the short form is taken.
pub fn milestone_id(millis: i64, index: &RowIndex) -> String {
    let digits = millis.to_string();
    let short = format!("H-{}", &digits[digits.len().saturating_sub(4)..]);
    if !index.contains(&short) {
        return short;
    }
    let mut millis = millis;
    loop {
        let long = format!("H-{millis}");
        if !index.contains(&long) {
            return long;
        }
        millis += 1;
    }
}

pub async fn list_milestones(
    state: &AppState,
    identity: &str,
    scope: Scope,
    role: Role,
) -> Result<Vec<Located<Milestone>>, ApiError> {
    let milestones = repository(state).list().await?;
    Ok(filter_by_scope(milestones, identity, scope, role))
}

pub async fn create_milestone(
    state: &AppState,
    req: CreateMilestoneRequest,
) -> Result<Located<Milestone>, ApiError> {
    if req.nombre.trim().is_empty() {
        return Err(ApiError::InvalidInput("nombre is required".into()));
    }

    let repo = repository(state);
    let mut mapped = repo.load().await?;
    let milestone = Milestone {
        id: milestone_id(now_millis(), &mapped.index),
        nombre: req.nombre.trim().to_string(),
        responsable: req.responsable.trim().to_string(),
        fecha_inicio: req
            .fecha_inicio
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(today_iso),
        fecha_fin: req.fecha_fin.trim().to_string(),
        estado: ESTADO_IN_PROGRESS.to_string(),
        area: req.area.unwrap_or_default().trim().to_string(),
        proyecto: req.proyecto.unwrap_or_default().trim().to_string(),
    };

    let row_number = mapped
        .append(repo.store(), std::slice::from_ref(&milestone))
        .await?;
    info!("Created milestone {} ({}) at row {row_number}", milestone.id, milestone.nombre);
    Ok(Located {
        row_number,
        record: milestone,
    })
}

pub async fn update_estado(state: &AppState, req: UpdateEstadoRequest) -> Result<u32, ApiError> {
    let estado = req.estado.trim();
    if estado.is_empty() {
        return Err(ApiError::InvalidInput("estado is required".into()));
    }
    let row = repository(state)
        .set_field(&req.target, "estado", estado)
        .await?;
    info!("Milestone at row {row} set to {estado}");
    Ok(row)
}

pub async fn update_milestone(
    state: &AppState,
    req: UpdateMilestoneRequest,
) -> Result<Located<Milestone>, ApiError> {
    let target = req.target.clone();
    let updated = repository(state)
        .modify(&target, |milestone| req.apply(milestone))
        .await?;
    info!("Milestone {} updated at row {}", updated.record.id, updated.row_number);
    Ok(updated)
}
