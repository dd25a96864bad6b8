use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use tablero::config::AppConfig;
use tablero::notify::{AssignmentNotice, Notifier, NotifyError};
use tablero::shared::state::AppState;
use tablero::store::MemoryTableStore;

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AssignmentNotice>>,
}

impl RecordingNotifier {
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

pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryTableStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_context(store: MemoryTableStore) -> TestContext {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
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
