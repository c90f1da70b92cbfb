//! # Strings Module
//!
//! Centralizes user-facing replies, command usage text and log messages.
//! Keeps wording consistent between handlers and the dispatcher.

pub mod help;
pub mod logs;
pub mod messages;
