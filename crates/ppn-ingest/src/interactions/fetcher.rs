// TripSit combos fetcher

use reqwest::Client;
use serde_json::{Map, Value};

use super::models::ComboRecord;
use crate::error::FetchFailure;
use crate::framework::coerce::truncate_chars;
use crate::target::ERROR_BODY_LIMIT;

/// The published combinations chart, fetched in one request
pub struct TripSitSource {
    client: Client,
    url: String,
}

impl TripSitSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and flatten the chart into one record per `(drug_a, drug_b)` entry
    pub async fn fetch_combos(&self) -> Result<Vec<ComboRecord>, FetchFailure> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_LIMIT),
            });
        }

        let bytes = response.bytes().await?;
        let chart: Map<String, Value> =
            serde_json::from_slice(&bytes).map_err(|e| FetchFailure::Decode(e.to_string()))?;

        Ok(flatten(chart))
    }
}

/// Flatten `{drug_a: {drug_b: details}}` in document order
pub fn flatten(chart: Map<String, Value>) -> Vec<ComboRecord> {
    let mut records = Vec::new();
    for (drug_a, entry) in chart {
        match entry {
            Value::Object(combos) => {
                records.extend(combos.into_iter().map(|(drug_b, details)| ComboRecord {
                    drug_a: drug_a.clone(),
                    drug_b: Some(drug_b),
                    details,
                }));
            },
            other => records.push(ComboRecord {
                drug_a,
                drug_b: None,
                details: other,
            }),
        }
    }
    records
}
