use crate::application::ports::remote_store::{RemoteFilter, RemoteStore};
use crate::domain::entities::Record;
use crate::domain::value_objects::{RecordId, RecordPayload, Table};
use crate::infrastructure::database::rows::timestamp_to_datetime;
use crate::shared::config::RemoteConfig;
use crate::shared::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// REST adapter for a PostgREST-style cloud store. Upserts merge on the id
/// key, so redelivering an already-applied outbox entry is a no-op remotely.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    owner_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemoteRow {
    id: String,
    payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(SyncError::Validation(
                "Remote endpoint must include http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            owner_id: config.owner_id.clone(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.endpoint, table.as_str())
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    fn row_from_record(&self, record: &Record) -> RemoteRow {
        RemoteRow {
            id: record.id.as_str().to_string(),
            payload: record.payload.as_json().clone(),
            owner_id: self.owner_id.clone(),
            created_at: record.created_at.timestamp_millis(),
            updated_at: record.updated_at.timestamp_millis(),
        }
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            Err(SyncError::RemoteUnavailable(message))
        } else {
            Err(SyncError::RemoteRejected(message))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upsert(&self, table: Table, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<RemoteRow> = records
            .iter()
            .map(|record| self.row_from_record(record))
            .collect();

        let request = self
            .apply_auth(self.client.post(self.table_url(table)))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows);

        Self::check_response(request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        let request = self
            .apply_auth(self.client.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id.as_str()))]);

        Self::check_response(request.send().await?).await?;
        Ok(())
    }

    async fn select(&self, table: Table, filter: &RemoteFilter) -> Result<Vec<Record>> {
        let mut request = self
            .apply_auth(self.client.get(self.table_url(table)))
            .query(&[("select", "*")]);
        if let Some(owner_id) = filter.owner_id.as_deref().or(self.owner_id.as_deref()) {
            request = request.query(&[("owner_id", format!("eq.{owner_id}"))]);
        }

        let response = Self::check_response(request.send().await?).await?;
        let rows: Vec<RemoteRow> = response.json().await?;
        rows.into_iter()
            .map(|row| record_from_row(table, row))
            .collect()
    }

    async fn count(&self, table: Table, filter: &RemoteFilter) -> Result<i64> {
        let mut request = self
            .apply_auth(self.client.head(self.table_url(table)))
            .header("Prefer", "count=exact")
            .query(&[("select", "id")]);
        if let Some(owner_id) = filter.owner_id.as_deref().or(self.owner_id.as_deref()) {
            request = request.query(&[("owner_id", format!("eq.{owner_id}"))]);
        }

        let response = Self::check_response(request.send().await?).await?;
        let content_range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        parse_content_range_total(content_range).ok_or_else(|| {
            SyncError::RemoteRejected(format!("Unparseable Content-Range: {content_range}"))
        })
    }

    async fn ping(&self) -> Result<()> {
        let request = self.apply_auth(self.client.head(&self.endpoint));
        Self::check_response(request.send().await?).await?;
        Ok(())
    }
}

fn record_from_row(table: Table, row: RemoteRow) -> Result<Record> {
    let id = RecordId::new(row.id).map_err(SyncError::RemoteRejected)?;
    let payload = RecordPayload::new(row.payload).map_err(SyncError::RemoteRejected)?;
    Ok(Record::new(
        table,
        id,
        payload,
        timestamp_to_datetime(row.created_at),
        timestamp_to_datetime(row.updated_at),
    ))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// `Content-Range: 0-24/25` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<i64> {
    value.rsplit('/').next()?.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let mut config = RemoteConfig {
            endpoint: "cloud.example.com".to_string(),
            api_key: None,
            owner_id: None,
            request_timeout: 5,
        };
        assert!(HttpRemoteStore::new(&config).is_err());

        config.endpoint = "https://cloud.example.com/rest/v1/".to_string();
        let store = HttpRemoteStore::new(&config).unwrap();
        assert_eq!(
            store.table_url(Table::Profiles),
            "https://cloud.example.com/rest/v1/profiles"
        );
    }

    #[test]
    fn test_parse_api_error_prefers_structured_message() {
        let status = StatusCode::CONFLICT;
        assert_eq!(
            parse_api_error(status, r#"{"message":"duplicate key"}"#),
            "duplicate key (409)"
        );
        assert_eq!(parse_api_error(status, ""), "HTTP 409");
        assert_eq!(parse_api_error(status, "boom"), "boom (409)");
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/25"), Some(25));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
