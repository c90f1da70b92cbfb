//! # Domain Types
//!
//! Common data structures used across the application logic: the outbound
//! directive every command produces, and the job records read from the index.

use serde::Deserialize;
use std::collections::BTreeMap;

/// What the bot should send back. Every handler, and the dispatcher's error
/// path, produces exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundDirective {
    PostMessage {
        text: String,
        attachments: Vec<Attachment>,
    },
    PostFile {
        content: Vec<u8>,
        metadata: FileMetadata,
    },
}

impl OutboundDirective {
    pub fn text(text: impl Into<String>) -> Self {
        Self::PostMessage {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn attachments(attachments: Vec<Attachment>) -> Self {
        Self::PostMessage {
            text: String::new(),
            attachments,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PostMessage { .. } => "post_message",
            Self::PostFile { .. } => "post_file",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub fallback: String,
    pub title: String,
    pub image_url: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub filename: String,
    pub mime_type: String,
    pub title: Option<String>,
}

/// A raw event handed over by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEvent {
    pub text: Option<String>,
    pub channel: String,
}

/// Job totals by status term (`job-queued`, `job-failed`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobCounts {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

impl JobCounts {
    /// Count for a status term; statuses the index did not report are 0.
    pub fn status(&self, term: &str) -> u64 {
        self.by_status.get(term).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct JobTimes {
    #[serde(default)]
    pub time_queued: Option<String>,
    #[serde(default)]
    pub time_start: Option<String>,
    #[serde(default)]
    pub time_end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct JobDetails {
    #[serde(default)]
    pub job_info: JobTimes,
}

/// Projected `_source` of the most recent failed job.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FailedJobRecord {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub payload_id: Option<String>,
    #[serde(default)]
    pub payload_hash: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub job: JobDetails,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub traceback: String,
}
