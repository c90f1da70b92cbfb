//! # Errors
//!
//! Error types shared across layers. "Not configured" and "not found" are not
//! errors here; handlers return those as ordinary replies.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure talking to the job-status index.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Unexpected response from {url}: {message}")]
    Shape { url: String, message: String },
    #[error("{last} (gave up after {attempts} attempts)")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<QueryError>,
    },
}

/// Fault raised while a command handler runs. The dispatcher turns every
/// variant into an `Error ...` reply.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{command} takes {expected} argument(s) ({names}) but {got} were given")]
    Arity {
        command: &'static str,
        expected: usize,
        names: &'static str,
        got: usize,
    },
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Failure at the message transport boundary.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
    #[error("Failed to send to {channel}: {message}")]
    Send { channel: String, message: String },
    #[error("Unsupported directive for this transport: {0}")]
    UnsupportedDirective(&'static str),
}
