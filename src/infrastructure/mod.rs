//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (`MessageChannel`, `JobIndex`).

pub mod matrix;
pub mod search;
