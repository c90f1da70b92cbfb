//! Query bodies for the Mozart job-status index

use serde_json::{Map, Value, json};

pub const JOB_STATUS_INDEX: &str = "job_status-current";
pub const JOB_DOC_TYPE: &str = "job";

/// Fields kept from a failed job document.
pub const FAILED_JOB_FIELDS: [&str; 9] = [
    "job_id",
    "payload_id",
    "payload_hash",
    "uuid",
    "job.job_info.time_queued",
    "job.job_info.time_start",
    "job.job_info.time_end",
    "error",
    "traceback",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Status facet over every job, no hits.
pub fn job_counts_query() -> Value {
    json!({
        "size": 0,
        "facets": {
            "status": {
                "terms": { "field": "status" }
            }
        }
    })
}

/// Newest failed job of `job_type`, projected to `FAILED_JOB_FIELDS`.
pub fn last_failed_query(job_type: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    { "terms": { "status": ["job-failed"] } },
                    { "terms": { "resource": ["job"] } },
                    { "terms": { "type": [job_type] } }
                ]
            }
        },
        "sort": [ { "job.job_info.time_end": { "order": SortOrder::Desc.as_str() } } ],
        "_source": FAILED_JOB_FIELDS,
        "size": 1
    })
}

fn term_clauses(pairs: &[(&str, &str)]) -> Vec<Value> {
    pairs
        .iter()
        .map(|(field, value)| json!({ "term": { *field: *value } }))
        .collect()
}

/// Bool query from AND and OR term pairs, for use with a scan.
///
/// When both are given the OR clauses become one nested `bool.should`
/// inside `must`, so at least one of them has to match.
#[allow(dead_code)]
pub fn build_term_query(ands: &[(&str, &str)], ors: &[(&str, &str)], order: SortOrder) -> Value {
    let mut must = term_clauses(ands);
    let should = term_clauses(ors);

    let mut bool_query = Map::new();
    if !should.is_empty() {
        if must.is_empty() {
            bool_query.insert("should".to_string(), Value::Array(should));
        } else {
            must.push(json!({ "bool": { "should": should } }));
        }
    }
    if !must.is_empty() {
        bool_query.insert("must".to_string(), Value::Array(must));
    }

    json!({
        "query": { "bool": bool_query },
        "sort": [ { "_timestamp": { "order": order.as_str() } } ],
        "partial_fields": {
            "partial": { "exclude": ["city", "context"] }
        }
    })
}
