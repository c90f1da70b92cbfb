//! # Application Layer
//!
//! Orchestration of the bot: parsing mentions, routing commands, delivering
//! replies, and the polling loop that ties them together.

pub mod delivery;
pub mod parsing;
pub mod router;
pub mod worker;
