use log::{info, warn};
use std::sync::Arc;

use crate::config::{AppConfig, MailConfig, StoreBackend, StoreConfig, TablesConfig};
use crate::notify::{LogNotifier, Notifier};
use crate::shared::locks::KeyedLocks;
use crate::store::sheets::SheetsAuth;
use crate::store::{MemoryTableStore, SheetsTableStore, TableStore, ValueInput};

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn TableStore>,
    pub notifier: Arc<dyn Notifier>,
    /// Serializes checklist saves per log table.
    pub checklist_locks: KeyedLocks,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn TableStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            store,
            notifier,
            checklist_locks: KeyedLocks::new(),
        }
    }

    pub fn tables(&self) -> &TablesConfig {
        &self.config.tables
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }
}

pub fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn TableStore>> {
    let value_input = ValueInput::from_literal_flag(config.literal_values);
    match config.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory table store, data is lost on restart");
            Ok(Arc::new(MemoryTableStore::new()))
        }
        StoreBackend::Sheets => {
            let spreadsheet_id = config
                .spreadsheet_id
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("store.spreadsheet_id is not set"))?;
            let auth = match (&config.access_token, &config.client_email, &config.private_key) {
                (Some(token), _, _) => SheetsAuth::AccessToken(token.clone()),
                (None, Some(client_email), Some(private_key)) => SheetsAuth::ServiceAccount {
                    client_email: client_email.clone(),
                    private_key: private_key.clone(),
                    token_uri: config.token_uri.clone(),
                },
                _ => anyhow::bail!("Sheets backend needs an access token or a service account"),
            };
            info!("Using Google Sheets spreadsheet {spreadsheet_id}");
            Ok(Arc::new(
                SheetsTableStore::new(spreadsheet_id, auth)
                    .with_api_base(&config.api_base)
                    .with_value_input(value_input),
            ))
        }
        #[cfg(feature = "xlsx")]
        StoreBackend::Xlsx => Ok(Arc::new(crate::store::XlsxTableStore::open(
            &config.xlsx_path,
            value_input,
        )?)),
        #[cfg(not(feature = "xlsx"))]
        StoreBackend::Xlsx => anyhow::bail!("The xlsx backend requires the `xlsx` feature"),
    }
}

pub fn build_notifier(config: &MailConfig) -> Arc<dyn Notifier> {
    #[cfg(feature = "mail")]
    if config.enabled {
        match crate::notify::SmtpNotifier::from_config(config) {
            Ok(notifier) => {
                info!("Mail notifications via {}:{}", config.smtp_host, config.smtp_port);
                return Arc::new(notifier);
            }
            Err(e) => warn!("Mail disabled: {e}"),
        }
    }
    #[cfg(not(feature = "mail"))]
    if config.enabled {
        warn!("Mail is enabled in configuration but the `mail` feature is off");
    }
    Arc::new(LogNotifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheets_store_requires_credentials() {
        let config = StoreConfig {
            backend: StoreBackend::Sheets,
            spreadsheet_id: Some("abc".into()),
            ..Default::default()
        };
        assert!(build_store(&config).is_err());
    }

    #[test]
    fn test_memory_store_by_default() {
        assert!(build_store(&StoreConfig::default()).is_ok());
    }
}
