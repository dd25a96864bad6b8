//! Milestone Progress Aggregation
//!
//! Pure functions over already-loaded milestones, tasks and results. Nothing
//! here touches the store; the handlers load the inputs and pass them in.

pub mod dates;
pub mod handlers;

use axum::{routing::get, Router};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::mapping::Located;
use crate::milestones::Milestone;
use crate::results::WeeklyResult;
use crate::scope::same_identity;
use crate::shared::state::AppState;
use crate::tasks::Task;
use crate::users::User;
use dates::parse_sheet_date;

pub const NO_AREA: &str = "Sin Área";
pub const NO_PROJECT: &str = "Proyecto General";

/// round(100 × completed / total), 0 when there is nothing to count.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((200 * completed + total) / (2 * total)) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub completed: usize,
    pub total: usize,
}

impl Tally {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut t, task| {
            t.total += 1;
            if task.is_done() {
                t.completed += 1;
            }
            t
        })
    }

    pub fn percentage(&self) -> u8 {
        percentage(self.completed, self.total)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    #[serde(flatten)]
    pub milestone: Located<Milestone>,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub start_month: u32,
    pub end_month: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub proyecto: String,
    pub percentage: u8,
    pub milestones: Vec<MilestoneProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaProgress {
    pub area: String,
    pub projects: Vec<ProjectProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub areas: Vec<AreaProgress>,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Months (1–12) the milestone spans on the Gantt chart.
pub fn month_span(milestone: &Milestone) -> (u32, u32) {
    let start = parse_sheet_date(&milestone.fecha_inicio).map_or(1, |d| d.month());
    let end = parse_sheet_date(&milestone.fecha_fin).map_or(start, |d| d.month());
    (start, end)
}

fn label(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn linked<'a>(tasks: &'a [Task], hito_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
    tasks.iter().filter(move |t| t.belongs_to(hito_id))
}

pub fn milestone_progress(milestone: Located<Milestone>, tasks: &[Task]) -> MilestoneProgress {
    let tally = Tally::of(linked(tasks, &milestone.record.id));
    let (start_month, end_month) = month_span(&milestone.record);
    MilestoneProgress {
        completed: tally.completed,
        total: tally.total,
        percentage: tally.percentage(),
        start_month,
        end_month,
        milestone,
    }
}

/// Groups milestones by area then project, in the order they first appear.
///
/// `linked_tasks` feeds the milestone and group percentages; the global
/// figure is computed over `scoped_tasks`.
pub fn aggregate(
    milestones: Vec<Located<Milestone>>,
    linked_tasks: &[Task],
    scoped_tasks: &[Task],
) -> ProgressReport {
    let mut areas: Vec<AreaProgress> = Vec::new();
    for milestone in milestones {
        let area = label(&milestone.record.area, NO_AREA);
        let proyecto = label(&milestone.record.proyecto, NO_PROJECT);
        let progress = milestone_progress(milestone, linked_tasks);

        let area_idx = match areas.iter().position(|a| a.area == area) {
            Some(idx) => idx,
            None => {
                areas.push(AreaProgress {
                    area,
                    projects: Vec::new(),
                });
                areas.len() - 1
            }
        };
        let projects = &mut areas[area_idx].projects;
        match projects.iter_mut().find(|p| p.proyecto == proyecto) {
            Some(project) => project.milestones.push(progress),
            None => projects.push(ProjectProgress {
                proyecto,
                percentage: 0,
                milestones: vec![progress],
            }),
        }
    }

    for project in areas.iter_mut().flat_map(|a| a.projects.iter_mut()) {
        let ids: HashSet<&str> = project
            .milestones
            .iter()
            .map(|m| m.milestone.record.id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        let tally = Tally::of(
            linked_tasks
                .iter()
                .filter(|t| t.hito_id.as_deref().is_some_and(|h| ids.contains(h.trim()))),
        );
        project.percentage = tally.percentage();
    }

    let global = Tally::of(scoped_tasks);
    ProgressReport {
        areas,
        completed: global.completed,
        total: global.total,
        percentage: global.percentage(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub percentage: u8,
    pub expected_results: Vec<String>,
    pub evaluation: String,
    /// Row of the week's first result, the handle for saving an evaluation.
    pub result_row: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaTeam {
    pub area: String,
    pub members: Vec<MemberProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub week_id: String,
    pub areas: Vec<AreaTeam>,
}

/// Pending and due before `today`, by the effective due date.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.is_pending() && parse_sheet_date(task.effective_due_date()).is_some_and(|d| d < today)
}

pub fn member_progress(
    user: &User,
    tasks: &[Task],
    results: &[Located<WeeklyResult>],
    today: NaiveDate,
) -> MemberProgress {
    let own: Vec<&Task> = tasks
        .iter()
        .filter(|t| same_identity(&user.email, &t.assigned_to))
        .collect();
    let tally = Tally::of(own.iter().copied());
    let own_results: Vec<&Located<WeeklyResult>> = results
        .iter()
        .filter(|r| same_identity(&user.email, &r.record.assigned_to))
        .collect();

    MemberProgress {
        email: user.email.clone(),
        name: user.name.clone(),
        completed: tally.completed,
        pending: tally.total - tally.completed,
        overdue: own.iter().filter(|t| is_overdue(t, today)).count(),
        percentage: tally.percentage(),
        expected_results: own_results
            .iter()
            .map(|r| r.record.expected_result.clone())
            .filter(|r| !r.trim().is_empty())
            .collect(),
        evaluation: own_results
            .first()
            .map(|r| r.record.evaluation.clone())
            .unwrap_or_default(),
        result_row: own_results.first().map(|r| r.row_number),
    }
}

/// Users grouped by area, areas sorted by name, users in directory order.
pub fn team_report(
    week_id: &str,
    users: &[User],
    tasks: &[Task],
    results: &[Located<WeeklyResult>],
    today: NaiveDate,
) -> TeamReport {
    let mut by_area: BTreeMap<&str, Vec<MemberProgress>> = BTreeMap::new();
    for user in users {
        by_area
            .entry(user.area.as_str())
            .or_default()
            .push(member_progress(user, tasks, results, today));
    }
    TeamReport {
        week_id: week_id.to_string(),
        areas: by_area
            .into_iter()
            .map(|(area, members)| AreaTeam {
                area: area.to_string(),
                members,
            })
            .collect(),
    }
}

pub fn configure_progress_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::DASHBOARD_PROGRESS,
            get(handlers::handle_progress_dashboard),
        )
        .route(ApiUrls::DASHBOARD_TEAM, get(handlers::handle_team_dashboard))
}
