//! # Usage Text
//!
//! One usage string per command. Shown after an `Error ...` reply so the
//! user can see how the command is meant to be called.

pub const HELP: &str = "`help`: list the commands I understand";

pub const STATUS: &str = concat!(
    "`status <cluster>`: current job status on a cluster\n",
    "* cluster: cluster name as configured in MOZART_ES_URL"
);

pub const FAILED: &str = concat!(
    "`failed <job_type> <cluster>`: last failed job of a type\n",
    "* job_type: job type to query, e.g. job-ingest\n",
    "* cluster: cluster name as configured in MOZART_ES_URL\n",
    "Replies with the job ID, error and traceback"
);

pub const TRANSFORM: &str = "`transform`: roll out";
