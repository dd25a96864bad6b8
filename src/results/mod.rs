//! Weekly results
//!
//! One expected result per person and week (`YYYY-Www`), later evaluated
//! Verde, Amarillo or Rojo.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub use types::WeeklyResult;

pub fn configure_result_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::RESULTADOS,
        get(handlers::handle_results_list).post(handlers::handle_results_post),
    )
}
