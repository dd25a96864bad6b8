//! API Router
//!
//! Combines the routes of every feature module into one router.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;
use crate::store::{ColumnSpan, StoreError, TableStore};

/// Reports whether the table store answers. A missing table still counts as
/// reachable.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let probe = state
        .store()
        .read_range(&state.tables().users.name, ColumnSpan::new(1, 1))
        .await;
    let store_ok = match probe {
        Ok(_) | Err(StoreError::TableNotFound(_)) => true,
        Err(e) => {
            warn!("Health probe failed: {e}");
            false
        }
    };

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(serde_json::json!({
            "status": if store_ok { "healthy" } else { "degraded" },
            "service": "tablero",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store_ok
        })),
    )
}

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::tasks::configure_task_routes())
        .merge(crate::milestones::configure_milestone_routes())
        .merge(crate::results::configure_result_routes())
        .merge(crate::checklist::configure_checklist_routes())
        .merge(crate::agenda::configure_agenda_routes())
        .merge(crate::users::configure_user_routes())
        .merge(crate::progress::configure_progress_routes())
        .merge(crate::notify::configure_notification_routes())
        .route(ApiUrls::HEALTH, get(health_check))
}

/// The full application: API routes, CORS, and the static front-end as the
/// fallback for every other path.
pub fn create_app(state: Arc<AppState>) -> Router {
    let site_path = state.config.server.site_path.clone();
    if std::path::Path::new(&site_path).exists() {
        info!("Serving static files from {site_path}");
    } else {
        warn!("Static site folder '{site_path}' not found");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    configure_api_routes()
        .with_state(state)
        .fallback_service(ServeDir::new(site_path))
        .layer(cors)
}
