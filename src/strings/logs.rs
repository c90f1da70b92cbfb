pub fn settings_loaded(path: &str, clusters: usize) -> String {
    format!("Loaded settings from {path} ({clusters} cluster(s) configured)")
}

pub const STARTING: &str = "Starting opsbot...";
pub const CONNECTED: &str = "opsbot connected and running!";
pub const SHUTDOWN: &str = "Shutting down...";

pub fn connect_failed(err: &str) -> String {
    format!("Connection failed. Invalid bot token or bot ID? {err}")
}

pub fn dispatching(channel: &str, name: &str, args: &[String]) -> String {
    format!("Dispatching cmd='{name}' args={args:?} channel='{channel}'")
}

pub fn reply_sent(channel: &str, kind: &str, id: &str) -> String {
    format!("Posted {kind} to {channel}: {id}")
}
