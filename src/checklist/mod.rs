//! Daily checklist
//!
//! Activities are defined in one table with a marker column per person;
//! each person's progress for a day lives in the log table and is replaced
//! as a whole on every save.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub fn configure_checklist_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::CHECKLIST,
        get(handlers::handle_checklist_get).post(handlers::handle_checklist_post),
    )
}
