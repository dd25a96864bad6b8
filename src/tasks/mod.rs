//! Tasks
//!
//! Per-person work items, optionally linked to a milestone through `hitoId`.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub use types::{Task, STATUS_DONE, STATUS_PENDING};

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::TASKS,
        get(handlers::handle_tasks_list).post(handlers::handle_tasks_post),
    )
}
