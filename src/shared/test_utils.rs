use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::notify::{AssignmentNotice, Notifier, NotifyError};
use crate::shared::state::AppState;
use crate::store::MemoryTableStore;

/// Keeps every notice it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<AssignmentNotice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits briefly for spawned deliveries to land.
    pub async fn wait_for(&self, count: usize) -> Vec<AssignmentNotice> {
        for _ in 0..50 {
            let sent = self.sent.lock().await;
            if sent.len() >= count {
                return sent.clone();
            }
            drop(sent);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &AssignmentNotice) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notice.clone());
        Ok(())
    }
}

/// Notifier that always fails, for checking writes survive broken mail.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notice: &AssignmentNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp unreachable".into()))
    }
}

pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryTableStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_context(store: MemoryTableStore) -> TestContext {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::new());
    let state = Arc::new(AppState::new(
        AppConfig::default(),
        store.clone(),
        notifier.clone(),
    ));
    TestContext {
        state,
        store,
        notifier,
    }
}

/// Store seeded with the canonical headers of every table.
pub fn seeded_store() -> MemoryTableStore {
    MemoryTableStore::new()
        .with_table(
            "Tareas",
            vec![vec![
                "ID",
                "Descripcion",
                "Asignado A",
                "Fecha Inicio",
                "Fecha Limite",
                "Estado",
                "Hito ID",
                "Area",
                "Proyecto",
                "Asignado Por",
                "Fecha Reprogramada",
            ]],
        )
        .with_table(
            "Cronograma",
            vec![vec![
                "ID",
                "Nombre",
                "Responsable",
                "Fecha Inicio",
                "Fecha Fin",
                "Estado",
                "Area",
                "Proyecto",
            ]],
        )
        .with_table(
            "ChecklistLog",
            vec![vec!["Fecha", "Email", "Actividad ID", "Planeada", "Completada"]],
        )
        .with_table(
            "Resultados",
            vec![vec!["Semana", "Email", "Resultado Esperado", "Evaluacion"]],
        )
}
