//! Milestones (hitos)
//!
//! Strategic deliverables on the master schedule. Completion is never stored;
//! it is derived from the tasks linked through `hitoId`.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub use types::Milestone;

pub fn configure_milestone_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::CRONOGRAMA,
        get(handlers::handle_milestones_list).post(handlers::handle_milestones_post),
    )
}
