//! REST write target for the portal database
//!
//! Speaks the PostgREST dialect exposed by the managed database: one
//! endpoint per table under `/rest/v1/`, API key plus bearer auth, and the
//! `Prefer: resolution=ignore-duplicates` header for insert-or-skip.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::IngestConfig;
use crate::framework::coerce::truncate_chars;
use crate::framework::{NameLookupError, NameSource, WriteRejection, WriteTarget};

/// Characters of a rejected response body kept for the report
pub const ERROR_BODY_LIMIT: usize = 300;

const PREFER_IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates";

/// HTTP client for the database's REST interface
pub struct RestTarget {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestTarget {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &IngestConfig, client: Client) -> Self {
        Self::new(
            client,
            config.supabase.url.clone(),
            config.supabase.service_role_key.clone(),
        )
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

fn is_write_success(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201 | 204)
}

#[async_trait]
impl WriteTarget for RestTarget {
    async fn insert_ignoring_conflicts(
        &self,
        table: &str,
        on_conflict: Option<&str>,
        rows: &Value,
    ) -> Result<(), WriteRejection> {
        let mut request = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", PREFER_IGNORE_DUPLICATES)
            .json(rows);
        if let Some(columns) = on_conflict {
            request = request.query(&[("on_conflict", columns)]);
        }

        let response = request.send().await.map_err(|e| WriteRejection {
            status: None,
            body: truncate_chars(&e.to_string(), ERROR_BODY_LIMIT),
        })?;

        let status = response.status();
        if is_write_success(status) {
            debug!(table, status = status.as_u16(), "Batch acknowledged");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WriteRejection {
            status: Some(status.as_u16()),
            body: truncate_chars(&body, ERROR_BODY_LIMIT),
        })
    }

    async fn fetch_names(&self, source: &NameSource) -> Result<Vec<String>, NameLookupError> {
        let response = self
            .authorized(self.client.get(self.table_url(source.table)))
            .query(&[("select", source.column)])
            .send()
            .await
            .map_err(|e| NameLookupError::Failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(NameLookupError::TableMissing);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NameLookupError::Failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_chars(&body, ERROR_BODY_LIMIT)
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| NameLookupError::Failed(format!("malformed response: {}", e)))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get(source.column).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}
