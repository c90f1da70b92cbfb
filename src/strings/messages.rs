//! # Messages
//!
//! Constant strings and format functions for user-facing replies.

use crate::domain::types::{FailedJobRecord, JobCounts};

pub const UNKNOWN_COMMAND: &str = "Sure...write some more code then I can do that!";
pub const HELP_HEADER: &str = "I don't take orders! But here's what you can ask me:\n";

pub const TRANSFORM_URL: &str =
    "https://raw.githubusercontent.com/hysds/hysds-ops-bot/master/hysds_ops_bot/megatron_transform.gif";
pub const TRANSFORM_TITLE: &str = "Pesky Autobots!";
pub const TRANSFORM_COLOR: &str = "#764FA5";

/// (label, status term) pairs in report order.
pub const STATUS_LINES: [(&str, &str); 7] = [
    ("Queued", "job-queued"),
    ("Started", "job-started"),
    ("Completed", "job-completed"),
    ("Failed", "job-failed"),
    ("Revoked", "job-revoked"),
    ("Deduped", "job-deduped"),
    ("Offline", "job-offline"),
];

pub fn help_listing<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut response = HELP_HEADER.to_string();
    for name in names {
        response.push_str(&format!("*{name}*\n"));
    }
    response
}

pub fn no_configuration(cluster: &str) -> String {
    format!("No configuration found for cluster \"{cluster}\". Try again.")
}

pub fn no_failed_job(job_type: &str, cluster: &str) -> String {
    format!("No failed \"{job_type}\" job found for cluster \"{cluster}\". Try again.")
}

pub fn command_error(err: &str, usage: &str) -> String {
    format!("Error {err}:\n{usage}")
}

pub fn job_status_report(cluster: &str, counts: &JobCounts) -> String {
    let mut response = format!("**Current job status on \"{cluster}\" cluster:**\n\n");
    response.push_str(&format!("Total: {}\n", counts.total));
    for (label, term) in STATUS_LINES {
        response.push_str(&format!("{label}: {}\n", counts.status(term)));
    }
    response
}

/// The traceback goes in a fenced block so markdown leaves it alone.
pub fn failed_job_report(job_type: &str, cluster: &str, job: &FailedJobRecord) -> String {
    format!(
        "**Last failed \"{job_type}\" job on \"{cluster}\" cluster:**\n\nID: {}\nError: {}\nTraceback:\n```\n{}\n```\n",
        job.job_id, job.error, job.traceback
    )
}
