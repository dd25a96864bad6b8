//! Meeting agenda, one entry per date.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub fn configure_agenda_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::AGENDA,
        get(handlers::handle_agenda_get).post(handlers::handle_agenda_post),
    )
}
