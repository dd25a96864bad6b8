//! Layered configuration: built-in defaults, then `tablero.toml`, then
//! `TABLERO_*` environment variables. The legacy deployment variables
//! (`GOOGLE_SHEET_ID`, `EMAIL_USER`, ...) override last when present.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::mapping::ColumnLayout;
use crate::store::sheets::{DEFAULT_API_BASE, DEFAULT_TOKEN_URI};

pub const DEFAULT_CONFIG_FILE: &str = "tablero.toml";
pub const ENV_PREFIX: &str = "TABLERO_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
    #[error("Incomplete configuration: {0}")]
    Incomplete(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub tables: TablesConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the static front-end, served as the router fallback.
    pub site_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            site_path: "./public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sheets,
    Xlsx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub spreadsheet_id: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    /// Pre-issued OAuth token, used instead of the service account when set.
    pub access_token: Option<String>,
    pub api_base: String,
    pub token_uri: String,
    /// Store written values as literal strings instead of "as typed".
    pub literal_values: bool,
    pub xlsx_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            spreadsheet_id: None,
            client_email: None,
            private_key: None,
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            literal_values: false,
            xlsx_path: "./tablero.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSettings {
    pub name: String,
    #[serde(default)]
    pub layout: ColumnLayout,
}

impl TableSettings {
    fn new(name: &str, layout: ColumnLayout) -> Self {
        Self {
            name: name.to_string(),
            layout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub tasks: TableSettings,
    pub milestones: TableSettings,
    pub checklist: TableSettings,
    pub checklist_log: TableSettings,
    pub results: TableSettings,
    pub agenda: TableSettings,
    pub users: TableSettings,
    pub areas: TableSettings,
}

impl Default for TablesConfig {
    fn default() -> Self {
        use ColumnLayout::{HeaderMatched, LegacyFixedOffset};
        Self {
            tasks: TableSettings::new("Tareas", HeaderMatched),
            milestones: TableSettings::new("Cronograma", HeaderMatched),
            checklist: TableSettings::new("Checklist", LegacyFixedOffset),
            checklist_log: TableSettings::new("ChecklistLog", LegacyFixedOffset),
            results: TableSettings::new("Resultados", LegacyFixedOffset),
            agenda: TableSettings::new("Agenda", LegacyFixedOffset),
            users: TableSettings::new("Usuarios", LegacyFixedOffset),
            areas: TableSettings::new("Areas", LegacyFixedOffset),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            username: None,
            password: None,
            from_name: "Sistema Estratégico".to_string(),
        }
    }
}

impl AppConfig {
    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Loads the configuration file named by `TABLERO_CONFIG` (default
    /// `tablero.toml`), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("TABLERO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_figment(Self::figment(&path))?;
        config.apply_legacy_env(|key| std::env::var(key).ok());
        config.validate()?;
        info!(
            "Configuration loaded from {path}: backend {:?}, mail {}",
            config.store.backend,
            if config.mail.enabled { "on" } else { "off" }
        );
        Ok(config)
    }

    /// Applies the variable names of the original deployment.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = var("GOOGLE_SHEET_ID") {
            self.store.spreadsheet_id = Some(id);
            if self.store.backend == StoreBackend::Memory {
                self.store.backend = StoreBackend::Sheets;
            }
        }
        if let Some(email) = var("GOOGLE_SHEETS_CLIENT_EMAIL") {
            self.store.client_email = Some(email);
        }
        if let Some(key) = var("GOOGLE_SHEETS_PRIVATE_KEY") {
            self.store.private_key = Some(unescape_newlines(&key));
        }
        if let Some(user) = var("EMAIL_USER") {
            self.mail.username = Some(user);
            self.mail.enabled = true;
        }
        if let Some(pass) = var("EMAIL_PASS") {
            self.mail.password = Some(pass);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Sheets {
            if self.store.spreadsheet_id.is_none() {
                return Err(ConfigError::Incomplete(
                    "store.spreadsheet_id is required for the sheets backend".into(),
                ));
            }
            let has_account =
                self.store.client_email.is_some() && self.store.private_key.is_some();
            if self.store.access_token.is_none() && !has_account {
                return Err(ConfigError::Incomplete(
                    "sheets backend needs store.access_token or client_email and private_key"
                        .into(),
                ));
            }
        }
        if self.mail.enabled && self.mail.username.is_none() {
            return Err(ConfigError::Incomplete(
                "mail.username is required when mail is enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Private keys stored in single-line env vars carry literal `\n` sequences.
pub fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
