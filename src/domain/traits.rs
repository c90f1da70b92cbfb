//! # Domain Traits
//!
//! Abstract interfaces for the external collaborators (chat transport, job index).
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;

use crate::domain::errors::{ChannelError, QueryError};
use crate::domain::types::{Attachment, FailedJobRecord, FileMetadata, IncomingEvent, JobCounts};

/// Abstract interface for a chat transport (e.g., Matrix, Slack, Console)
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Log in and start receiving events
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Drain the events received since the last poll (may be empty)
    async fn poll_events(&self) -> Result<Vec<IncomingEvent>, ChannelError>;

    /// Post a text message, optionally with attachments
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<String, ChannelError>;

    /// Upload a file. Transports without file support keep the default.
    async fn post_file(
        &self,
        _channel: &str,
        _content: &[u8],
        _metadata: &FileMetadata,
    ) -> Result<String, ChannelError> {
        Err(ChannelError::UnsupportedDirective("post_file"))
    }
}

/// Domain questions asked of a cluster's job-status index.
#[async_trait]
pub trait JobIndex: Send + Sync {
    /// Total number of jobs and counts by status
    async fn job_counts(&self, base_url: &str) -> Result<JobCounts, QueryError>;

    /// Most recent failed job of `job_type`, if any
    async fn last_failed_job(
        &self,
        base_url: &str,
        job_type: &str,
    ) -> Result<Option<FailedJobRecord>, QueryError>;
}
