//! Google Sheets REST v4 backend.
//!
//! Authenticates either with a static bearer token or with a service account
//! (JWT bearer grant). Access tokens are cached until shortly before expiry.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{a1, descending_rows, ColumnSpan, Row, StoreError, TableStore, ValueInput};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub enum SheetsAuth {
    /// Pre-issued OAuth access token.
    AccessToken(String),
    ServiceAccount {
        client_email: String,
        private_key: String,
        token_uri: String,
    },
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

pub struct SheetsTableStore {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    auth: SheetsAuth,
    value_input: ValueInput,
    token: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for SheetsTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsTableStore")
            .field("api_base", &self.api_base)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("value_input", &self.value_input)
            .finish_non_exhaustive()
    }
}

impl SheetsTableStore {
    pub fn new(spreadsheet_id: &str, auth: SheetsAuth) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
            value_input: ValueInput::default(),
            token: RwLock::new(None),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_value_input(mut self, value_input: ValueInput) -> Self {
        self.value_input = value_input;
        self
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/v4/spreadsheets/{}", self.api_base, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(range)
        )
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let (client_email, private_key, token_uri) = match &self.auth {
            SheetsAuth::AccessToken(token) => return Ok(token.clone()),
            SheetsAuth::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => (client_email, private_key, token_uri),
        };

        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.token.write().await;
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(cached.token.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: client_email,
            scope: SCOPE,
            aud: token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("Invalid private key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(format!("Failed to sign assertion: {e}")))?;

        let body = format!(
            "grant_type={}&assertion={}",
            urlencoding::encode("urn:ietf:params:oauth:grant-type:jwt-bearer"),
            urlencoding::encode(&assertion)
        );
        let response = self
            .client
            .post(token_uri.as_str())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "Token endpoint returned {status}: {text}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("Invalid token response: {e}")))?;
        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS as u64);
        info!("Obtained Sheets access token for {client_email}, valid {lifetime}s");

        *slot = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(token.access_token)
    }

    async fn send(
        &self,
        table: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, StoreError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()));
        }

        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(text);

        if status == reqwest::StatusCode::NOT_FOUND
            || (status == reqwest::StatusCode::BAD_REQUEST
                && message.contains("Unable to parse range"))
        {
            debug!("Sheet {table} not found: {message}");
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        warn!("Sheets API error {} on {table}: {message}", status.as_u16());
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn batch_update(&self, table: &str, requests: Vec<Value>) -> Result<Value, StoreError> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let request = self
            .client
            .post(url)
            .json(&json!({ "requests": requests }));
        self.send(table, request).await
    }
}

/// Renders a cell as the string the mapping layer sees.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableStore for SheetsTableStore {
    async fn read_range(&self, table: &str, span: ColumnSpan) -> Result<Vec<Row>, StoreError> {
        let request = self.client.get(self.values_url(&span.a1(table)));
        let body = self.send(table, request).await?;
        let range: ValueRange =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_row(
        &self,
        table: &str,
        row: u32,
        start_column: u32,
        values: Row,
    ) -> Result<(), StoreError> {
        if row == 0 || start_column == 0 || values.is_empty() {
            return Err(StoreError::InvalidRow {
                table: table.to_string(),
                row,
            });
        }
        let last = start_column + values.len() as u32 - 1;
        let range = a1::row_range(table, row, start_column, last);
        debug!("Writing {range}");
        let request = self
            .client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", self.value_input.as_api_str())])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [values],
            }));
        self.send(table, request).await?;
        Ok(())
    }

    async fn append_rows(
        &self,
        table: &str,
        span: ColumnSpan,
        rows: Vec<Row>,
    ) -> Result<u32, StoreError> {
        let range = span.a1(table);
        let url = format!("{}:append", self.values_url(&range));
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", self.value_input.as_api_str()),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({
                "majorDimension": "ROWS",
                "values": rows,
            }));
        let body = self.send(table, request).await?;
        let response: AppendResponse =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        response
            .updates
            .and_then(|u| u.updated_range)
            .as_deref()
            .and_then(a1::first_row)
            .ok_or_else(|| StoreError::Decode(format!("Append to {table} returned no range")))
    }

    async fn delete_rows(&self, table: &str, rows: &[u32]) -> Result<(), StoreError> {
        let ordered = descending_rows(rows);
        if ordered.is_empty() {
            return Ok(());
        }
        let sheet_id = self.table_id(table).await?;
        let requests = ordered
            .iter()
            .map(|row| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row - 1,
                            "endIndex": row,
                        }
                    }
                })
            })
            .collect();
        debug!("Deleting rows {ordered:?} from {table}");
        self.batch_update(table, requests).await?;
        Ok(())
    }

    async fn table_id(&self, table: &str) -> Result<i64, StoreError> {
        let request = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let body = self.send(table, request).await?;
        let meta: SpreadsheetMeta =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == table)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        info!("Creating sheet {table}");
        self.batch_update(
            table,
            vec![json!({ "addSheet": { "properties": { "title": table } } })],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn store(server: &Server) -> SheetsTableStore {
        SheetsTableStore::new("sheet123", SheetsAuth::AccessToken("test-token".into()))
            .with_api_base(&server.url())
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!(true)), "TRUE");
        assert_eq!(cell_to_string(&json!(false)), "FALSE");
        assert_eq!(cell_to_string(&json!(12)), "12");
        assert_eq!(cell_to_string(&json!("Pendiente")), "Pendiente");
        assert_eq!(cell_to_string(&Value::Null), "");
    }

    #[tokio::test]
    async fn test_read_range_converts_cells() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/sheet123/values/Tareas".into()))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"range":"Tareas!A1:E3","values":[["ID","Descripcion"],["1",true],[]]}"#)
            .create_async()
            .await;

        let rows = store(&server)
            .read_range("Tareas", ColumnSpan::new(1, 5))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "TRUE"]);
        assert!(rows[2].is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_range_is_table_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/sheet123/values/".into()))
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"Unable to parse range: Agenda!A:E"}}"#)
            .create_async()
            .await;

        let err = store(&server)
            .read_range("Agenda", ColumnSpan::new(1, 5))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/sheet123/values/".into()))
            .with_status(503)
            .with_body(r#"{"error":{"code":503,"message":"Backend unavailable"}}"#)
            .create_async()
            .await;

        let err = store(&server)
            .read_range("Tareas", ColumnSpan::new(1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, ref message } if message == "Backend unavailable"));
    }

    #[tokio::test]
    async fn test_append_returns_first_updated_row() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(r"/values/Tareas%21A%3AB:append".into()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()),
                Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
            ]))
            .match_body(Matcher::PartialJson(json!({"values": [["7", "Hola"]]})))
            .with_status(200)
            .with_body(r#"{"updates":{"updatedRange":"Tareas!A12:B12","updatedRows":1}}"#)
            .create_async()
            .await;

        let first = store(&server)
            .with_value_input(ValueInput::Raw)
            .append_rows("Tareas", ColumnSpan::new(1, 2), vec![vec!["7".into(), "Hola".into()]])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(first, 12);
    }

    #[tokio::test]
    async fn test_write_row_targets_single_row_range() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Regex(r"/values/Resultados%21D7%3AD7".into()))
            .match_query(Matcher::UrlEncoded(
                "valueInputOption".into(),
                "USER_ENTERED".into(),
            ))
            .match_body(Matcher::PartialJson(json!({"values": [["Verde"]]})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        store(&server)
            .write_row("Resultados", 7, 4, vec!["Verde".into()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_rows_sends_one_descending_batch() {
        let mut server = Server::new_async().await;
        let meta = server
            .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/sheet123($|\?)".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"sheets":[{"properties":{"sheetId":0,"title":"Tareas"}},{"properties":{"sheetId":42,"title":"ChecklistLog"}}]}"#,
            )
            .create_async()
            .await;
        let batch = server
            .mock("POST", "/v4/spreadsheets/sheet123:batchUpdate")
            .match_body(Matcher::Json(json!({
                "requests": [
                    {"deleteDimension": {"range": {"sheetId": 42, "dimension": "ROWS", "startIndex": 3, "endIndex": 4}}},
                    {"deleteDimension": {"range": {"sheetId": 42, "dimension": "ROWS", "startIndex": 1, "endIndex": 2}}}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"replies":[{},{}]}"#)
            .expect(1)
            .create_async()
            .await;

        store(&server)
            .delete_rows("ChecklistLog", &[2, 4])
            .await
            .unwrap();
        meta.assert_async().await;
        batch.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_sheet_id_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/sheet123($|\?)".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"sheets":[{"properties":{"sheetId":0,"title":"Tareas"}}]}"#)
            .create_async()
            .await;

        let err = store(&server).table_id("Agenda").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
