//! HTTPS client for a PostgREST-compatible table API (`/rest/v1/{table}`).

use crate::domain::model::{Record, Table};
use crate::domain::query::{Filter, Query};
use crate::infra::remote::{RemoteConnector, RemoteError, RemoteResult, RemoteStore};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Postgres "undefined_table".
const PG_UNDEFINED_TABLE: &str = "42P01";
/// PostgREST "table not found in the schema cache".
const PGRST_TABLE_NOT_FOUND: &str = "PGRST205";

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: 30,
        }
    }

    fn rest_root(&self) -> String {
        format!("{}/rest/v1", self.base_url.trim_end_matches('/'))
    }
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Classifies a failed response into a `RemoteError`.
pub fn classify_error(status: u16, body: &str) -> RemoteError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .unwrap_or_else(|| body.trim().to_string());
    let detail = format!("HTTP {}: {}", status, message);

    let code_says_missing = matches!(
        parsed.code.as_deref(),
        Some(PG_UNDEFINED_TABLE) | Some(PGRST_TABLE_NOT_FOUND)
    );
    let lower = message.to_lowercase();
    let message_says_missing = (lower.contains("relation") && lower.contains("does not exist"))
        || lower.contains("could not find the table");

    if code_says_missing || message_says_missing {
        RemoteError::table_missing(detail)
    } else {
        RemoteError::transient(detail)
    }
}

fn encode_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn encode_list_item(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

/// Translates a `Query` into PostgREST query parameters.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for (field, filter) in query.filters() {
        let value = match filter {
            Filter::Eq(JsonValue::Null) => "is.null".to_string(),
            Filter::Eq(v) => format!("eq.{}", encode_scalar(v)),
            Filter::In(values) => format!(
                "in.({})",
                values
                    .iter()
                    .map(encode_list_item)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        };
        params.push((field.to_string(), value));
    }

    if let Some(order_field) = query.order_by.as_deref() {
        let direction = if query.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order_field, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

pub struct RestRemoteStore {
    config: RestConfig,
    client: Client,
}

impl RestRemoteStore {
    pub fn new(config: RestConfig) -> RemoteResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.config.rest_root(), table.as_str())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status.as_u16(), &body))
        }
    }
}

fn build_client(config: &RestConfig) -> RemoteResult<Client> {
    let mut headers = header::HeaderMap::new();
    if let Some(ref api_key) = config.api_key {
        let key = header::HeaderValue::from_str(api_key)
            .map_err(|e| RemoteError::transient(format!("Invalid API key: {}", e)))?;
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| RemoteError::transient(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);
    }

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| RemoteError::transient(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Record>> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&query_params(query))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn insert(&self, table: Table, rows: &[Record]) -> RemoteResult<Vec<Record>> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update(&self, table: Table, id: &str, patch: &Record) -> RemoteResult<Record> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        let rows: Vec<Record> = Self::decode(response).await?;
        rows.into_iter().next().ok_or_else(|| {
            RemoteError::not_found(format!("no row with id '{}' in {}", id, table))
        })
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status.as_u16(), &body))
        }
    }

    async fn probe(&self, table: Table) -> RemoteResult<()> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        let _: Vec<JsonValue> = Self::decode(response).await?;
        Ok(())
    }
}

/// Connector for `RestRemoteStore`.
#[derive(Debug, Clone)]
pub struct RestConnector {
    config: RestConfig,
}

impl RestConnector {
    pub fn new(config: RestConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RemoteConnector for RestConnector {
    async fn probe_network(&self) -> bool {
        let client = match build_client(&self.config) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build HTTP client for reachability probe");
                return false;
            }
        };
        // Any HTTP answer, even 401/404, proves the endpoint is reachable.
        match client.get(format!("{}/", self.config.rest_root())).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.config.base_url, "remote endpoint unreachable");
                false
            }
        }
    }

    async fn connect(&self) -> RemoteResult<Arc<dyn RemoteStore>> {
        let store = RestRemoteStore::new(self.config.clone())?;
        Ok(Arc::new(store))
    }
}
