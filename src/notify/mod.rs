//! Assignment notifications.
//!
//! Sending is fire-and-forget: `dispatch` spawns the delivery and only logs
//! failures, so a broken mail setup never fails the write that triggered it.

pub mod ics;
#[cfg(feature = "mail")]
pub mod smtp;

use async_trait::async_trait;
use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::wire::{message, parse_body, required};

#[cfg(feature = "mail")]
pub use smtp::SmtpNotifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentNotice {
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_date: String,
    #[serde(rename = "assignedTo")]
    pub assigned_to: String,
    #[serde(rename = "asignadoPor", alias = "assignedBy")]
    pub assigned_by: String,
    pub area: String,
    #[serde(rename = "proyecto", alias = "project")]
    pub project: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Calendar error: {0}")]
    Calendar(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &AssignmentNotice) -> Result<(), NotifyError>;
}

/// Logs notices instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &AssignmentNotice) -> Result<(), NotifyError> {
        info!(
            "Notification for {}: {} (due {}, by {})",
            notice.assigned_to, notice.description, notice.due_date, notice.assigned_by
        );
        Ok(())
    }
}

/// Sends `notice` in the background.
pub fn dispatch(notifier: Arc<dyn Notifier>, notice: AssignmentNotice) {
    if notice.assigned_to.trim().is_empty() {
        warn!("Skipping notification without recipient: {}", notice.description);
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&notice).await {
            warn!("Notification to {} failed: {e}", notice.assigned_to);
        }
    });
}

/// Sends a notice on request and waits for the delivery outcome.
pub async fn handle_send_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let notice: AssignmentNotice = parse_body(&body)?;
    required(Some(notice.assigned_to.as_str()), "assignedTo")?;
    state
        .notifier
        .notify(&notice)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(message("Enviado con éxito"))
}

pub fn configure_notification_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::NOTIFICATIONS, post(handle_send_notification))
}
