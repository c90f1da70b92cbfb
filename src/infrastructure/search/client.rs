//! # Search Client
//!
//! Talks to a cluster's Elasticsearch job-status index over HTTP. Each round
//! trip goes through the configured `Backoff`, so a flaky index is retried
//! before an error reaches the command handlers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::backoff::Backoff;
use super::query::{self, JOB_DOC_TYPE, JOB_STATUS_INDEX};
use crate::domain::errors::QueryError;
use crate::domain::traits::JobIndex;
use crate::domain::types::{FailedJobRecord, JobCounts};

const SCROLL_KEEPALIVE: &str = "60m";
const SCAN_PAGE_SIZE: u32 = 100;

/// One raw hit from a search or scroll batch.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// `hits.total` is a number on older clusters and an object on newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HitsTotal {
    Count(u64),
    Object { value: u64 },
}

impl HitsTotal {
    fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(n) => *n,
            HitsTotal::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hits<T> {
    total: HitsTotal,
    #[serde(default = "Vec::new")]
    hits: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    hits: Hits<T>,
}

#[derive(Debug, Deserialize)]
struct SourceHit<T> {
    #[serde(rename = "_source")]
    source: T,
}

#[derive(Debug, Deserialize)]
struct FacetResponse {
    facets: Facets,
}

#[derive(Debug, Deserialize)]
struct Facets {
    status: StatusFacet,
}

#[derive(Debug, Deserialize)]
struct StatusFacet {
    total: u64,
    terms: Vec<TermCount>,
}

#[derive(Debug, Deserialize)]
struct TermCount {
    term: String,
    count: u64,
}

/// Body sent with a request.
enum Payload<'a> {
    Json(&'a Value),
    Raw(&'a str),
}

pub struct SearchClient {
    http: Client,
    backoff: Backoff,
}

impl SearchClient {
    pub fn new(backoff: Backoff, timeout: Duration) -> Result<Self, QueryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Transport {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { http, backoff })
    }

    /// Scan `index` with `query`, following scroll cursors until an empty batch.
    #[allow(dead_code)]
    pub async fn scroll(
        &self,
        base_url: &str,
        index: &str,
        query: &Value,
    ) -> Result<Vec<SearchHit>, QueryError> {
        let base_url = base_url.trim_end_matches('/');
        let scan_url = format!(
            "{}/{}/_search?search_type=scan&scroll=60&size={}",
            base_url, index, SCAN_PAGE_SIZE
        );
        tracing::info!("Scanning {} on {}", index, base_url);

        let first: SearchResponse<SearchHit> =
            self.request("scan", &scan_url, Payload::Json(query)).await?;
        tracing::debug!("Scan reports {} total hits", first.hits.total.value());

        let mut hits = first.hits.hits;
        let mut scroll_id = first.scroll_id;
        let scroll_url = format!("{}/_search/scroll?scroll={}", base_url, SCROLL_KEEPALIVE);

        loop {
            let cursor = scroll_id.ok_or_else(|| QueryError::Shape {
                url: scroll_url.clone(),
                message: "missing _scroll_id".to_string(),
            })?;
            let batch: SearchResponse<SearchHit> = self
                .request("scroll", &scroll_url, Payload::Raw(&cursor))
                .await?;
            if batch.hits.hits.is_empty() {
                break;
            }
            hits.extend(batch.hits.hits);
            scroll_id = batch.scroll_id.or(Some(cursor));
        }

        tracing::info!("Scan of {} returned {} hits", index, hits.len());
        Ok(hits)
    }

    fn job_search_url(base_url: &str) -> String {
        format!(
            "{}/{}/{}/_search",
            base_url.trim_end_matches('/'),
            JOB_STATUS_INDEX,
            JOB_DOC_TYPE
        )
    }

    /// POST with retries, decoding the body into `T`.
    async fn request<T: DeserializeOwned>(
        &self,
        label: &str,
        url: &str,
        payload: Payload<'_>,
    ) -> Result<T, QueryError> {
        let body = match payload {
            Payload::Json(value) => value.to_string(),
            Payload::Raw(text) => text.to_string(),
        };
        tracing::debug!("POST {} {}", url, body);
        self.backoff
            .retry(label, || self.post_once(url, &body))
            .await
    }

    async fn post_once<T: DeserializeOwned>(&self, url: &str, body: &str) -> Result<T, QueryError> {
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| QueryError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(QueryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| QueryError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| QueryError::Shape {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl JobIndex for SearchClient {
    async fn job_counts(&self, base_url: &str) -> Result<JobCounts, QueryError> {
        let url = Self::job_search_url(base_url);
        let response: FacetResponse = self
            .request("job_counts", &url, Payload::Json(&query::job_counts_query()))
            .await?;

        let by_status: BTreeMap<String, u64> = response
            .facets
            .status
            .terms
            .into_iter()
            .map(|t| (t.term, t.count))
            .collect();
        Ok(JobCounts {
            total: response.facets.status.total,
            by_status,
        })
    }

    async fn last_failed_job(
        &self,
        base_url: &str,
        job_type: &str,
    ) -> Result<Option<FailedJobRecord>, QueryError> {
        let url = Self::job_search_url(base_url);
        let response: SearchResponse<SourceHit<FailedJobRecord>> = self
            .request(
                "last_failed_job",
                &url,
                Payload::Json(&query::last_failed_query(job_type)),
            )
            .await?;

        if response.hits.total.value() == 0 {
            return Ok(None);
        }
        let latest = response.hits.hits.into_iter().next().map(|hit| hit.source);
        if let Some(job) = &latest {
            tracing::info!("Latest failed {} job: {}", job_type, job.job_id);
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::search::query::{SortOrder, build_term_query};
    use httpmock::prelude::*;
    use serde_json::json;

    const JOB_SEARCH: &str = "/job_status-current/job/_search";

    fn client(max_tries: u32) -> SearchClient {
        let backoff = Backoff::new(
            max_tries,
            Duration::from_millis(5),
            Duration::from_millis(20),
        );
        SearchClient::new(backoff, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_job_counts_from_facets() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(JOB_SEARCH)
                    .json_body_includes(json!({ "size": 0 }).to_string());
                then.status(200).json_body(json!({
                    "hits": { "total": 42, "hits": [] },
                    "facets": {
                        "status": {
                            "total": 42,
                            "terms": [
                                { "term": "job-queued", "count": 5 },
                                { "term": "job-completed", "count": 30 }
                            ]
                        }
                    }
                }));
            })
            .await;

        let counts = client(3).job_counts(&server.base_url()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(counts.total, 42);
        assert_eq!(counts.by_status.len(), 2);
        assert_eq!(counts.status("job-queued"), 5);
        assert_eq!(counts.status("job-completed"), 30);
        assert_eq!(counts.status("job-failed"), 0);
    }

    #[tokio::test]
    async fn test_job_counts_tolerates_trailing_slash() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH);
                then.status(200).json_body(json!({
                    "facets": { "status": { "total": 0, "terms": [] } }
                }));
            })
            .await;

        let base = format!("{}/", server.base_url());
        let counts = client(1).job_counts(&base).await.unwrap();
        mock.assert_async().await;
        assert_eq!(counts, JobCounts::default());
    }

    #[tokio::test]
    async fn test_job_counts_retries_then_gives_up() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH);
                then.status(503).body("service unavailable");
            })
            .await;

        let err = client(3).job_counts(&server.base_url()).await.unwrap_err();
        mock.assert_calls_async(3).await;
        match err {
            QueryError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, QueryError::Status { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_job_counts_malformed_body_is_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH);
                then.status(200).json_body(json!({ "hits": { "total": 1 } }));
            })
            .await;

        let err = client(2).job_counts(&server.base_url()).await.unwrap_err();
        mock.assert_calls_async(2).await;
        assert!(err.to_string().contains("Unexpected response"));
    }

    #[tokio::test]
    async fn test_last_failed_job_returns_first_hit() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH).json_body_includes(
                    json!({ "size": 1, "sort": [ { "job.job_info.time_end": { "order": "desc" } } ] })
                        .to_string(),
                );
                then.status(200).json_body(json!({
                    "hits": {
                        "total": 7,
                        "hits": [{
                            "_id": "abc",
                            "_source": {
                                "job_id": "job-ingest-2017-01-01",
                                "uuid": "5f0c",
                                "job": { "job_info": { "time_end": "2017-01-01T00:10:00Z" } },
                                "error": "RuntimeError: disk full",
                                "traceback": "Traceback (most recent call last): ..."
                            }
                        }]
                    }
                }));
            })
            .await;

        let job = client(3)
            .last_failed_job(&server.base_url(), "job-ingest")
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;
        assert_eq!(job.job_id, "job-ingest-2017-01-01");
        assert_eq!(job.uuid.as_deref(), Some("5f0c"));
        assert_eq!(job.error, "RuntimeError: disk full");
        assert_eq!(
            job.job.job_info.time_end.as_deref(),
            Some("2017-01-01T00:10:00Z")
        );
        assert!(job.payload_id.is_none());
    }

    #[tokio::test]
    async fn test_last_failed_job_none_when_zero_hits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH);
                then.status(200)
                    .json_body(json!({ "hits": { "total": 0, "hits": [] } }));
            })
            .await;

        let job = client(3)
            .last_failed_job(&server.base_url(), "job-ingest")
            .await
            .unwrap();
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn test_last_failed_job_accepts_object_total() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(JOB_SEARCH);
                then.status(200).json_body(json!({
                    "hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] }
                }));
            })
            .await;

        let job = client(1)
            .last_failed_job(&server.base_url(), "job-ingest")
            .await
            .unwrap();
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn test_scroll_accumulates_batches_until_empty() {
        let server = MockServer::start_async().await;
        let scan = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/job_status-current/_search")
                    .query_param("search_type", "scan")
                    .query_param("size", "100");
                then.status(200).json_body(json!({
                    "_scroll_id": "cursor-1",
                    "hits": { "total": 3, "hits": [] }
                }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/_search/scroll")
                    .query_param("scroll", "60m")
                    .body("cursor-1");
                then.status(200).json_body(json!({
                    "_scroll_id": "cursor-2",
                    "hits": { "total": 3, "hits": [
                        { "_id": "1", "_source": { "status": "job-failed" } },
                        { "_id": "2", "_source": { "status": "job-failed" } }
                    ] }
                }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(POST).path("/_search/scroll").body("cursor-2");
                then.status(200).json_body(json!({
                    "_scroll_id": "cursor-3",
                    "hits": { "total": 3, "hits": [
                        { "_id": "3", "_source": { "status": "job-failed" } }
                    ] }
                }));
            })
            .await;
        let last = server
            .mock_async(|when, then| {
                when.method(POST).path("/_search/scroll").body("cursor-3");
                then.status(200).json_body(json!({
                    "_scroll_id": "cursor-4",
                    "hits": { "total": 3, "hits": [] }
                }));
            })
            .await;

        let query = build_term_query(&[("status", "job-failed")], &[], SortOrder::Desc);
        let hits = client(3)
            .scroll(&server.base_url(), "job_status-current", &query)
            .await
            .unwrap();

        scan.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
        last.assert_async().await;
        let ids: Vec<_> = hits.iter().filter_map(|h| h.id.as_deref()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(hits[0].source["status"], "job-failed");
    }

    #[tokio::test]
    async fn test_scroll_without_cursor_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/job_status-current/_search");
                then.status(200)
                    .json_body(json!({ "hits": { "total": 0, "hits": [] } }));
            })
            .await;

        let err = client(1)
            .scroll(&server.base_url(), "job_status-current", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Shape { .. }));
    }
}
