// ClinicalTrials.gov API v2 page fetcher

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{PAGE_SIZE, STATUS_FILTER, STUDY_FIELDS};
use crate::error::FetchFailure;
use crate::framework::coerce::truncate_chars;
use crate::framework::{Page, PageSource};
use crate::target::ERROR_BODY_LIMIT;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiesPage {
    #[serde(default)]
    studies: Vec<Value>,
    next_page_token: Option<String>,
}

/// Study search against the registry, one intervention term at a time
pub struct CtGovSource {
    client: Client,
    api_url: String,
}

impl CtGovSource {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn query(term: &str, token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query.intr", term.to_string()),
            ("filter.overallStatus", STATUS_FILTER.to_string()),
            ("fields", STUDY_FIELDS.join(",")),
            ("pageSize", PAGE_SIZE.to_string()),
            ("format", "json".to_string()),
        ];
        if let Some(token) = token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }
}

#[async_trait]
impl PageSource for CtGovSource {
    type Item = Value;

    async fn fetch_page(&self, term: &str, token: Option<&str>) -> Result<Page<Value>, FetchFailure> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&Self::query(term, token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_LIMIT),
            });
        }

        let bytes = response.bytes().await?;
        let page: StudiesPage =
            serde_json::from_slice(&bytes).map_err(|e| FetchFailure::Decode(e.to_string()))?;

        Ok(Page::new(page.studies, page.next_page_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_query_has_no_token() {
        let params = CtGovSource::query("MDMA", None);
        assert!(params.contains(&("query.intr", "MDMA".to_string())));
        assert!(params.contains(&("pageSize", "100".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "pageToken"));
    }

    #[test]
    fn test_continuation_query_carries_token() {
        let params = CtGovSource::query("MDMA", Some("abc"));
        assert!(params.contains(&("pageToken", "abc".to_string())));
        assert!(params
            .iter()
            .any(|(k, v)| *k == "fields" && v.contains("protocolSection.identificationModule.nctId")));
    }
}
