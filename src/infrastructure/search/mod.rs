//! # Job-Status Search
//!
//! HTTP client for the Mozart Elasticsearch index: query bodies, the
//! retrying client, and its backoff policy.

pub mod backoff;
pub mod client;
pub mod query;

pub use backoff::Backoff;
pub use client::SearchClient;
