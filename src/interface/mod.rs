//! # Interface Layer
//!
//! User-facing commands: the registry and one handler per chat command.

pub mod commands;
