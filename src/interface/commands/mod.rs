//! # Command Handlers
//!
//! Contains the handler for each supported command (help, status, failed, transform)
//! and the registry the router looks them up in.
//! Handlers never talk to the chat transport; they return an `OutboundDirective`.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::config::Settings;
use crate::domain::errors::CommandError;
use crate::domain::traits::JobIndex;
use crate::domain::types::OutboundDirective;

pub mod failed;
pub mod help;
pub mod status;
pub mod transform;

/// Everything a handler may read while it runs.
pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    pub registry: &'a CommandRegistry,
    pub index: &'a dyn JobIndex,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the command is invoked by (first token of the mention).
    fn name(&self) -> &'static str;

    /// Shown to the user when the command fails.
    fn usage(&self) -> &'static str;

    async fn handle(
        &self,
        args: &[String],
        ctx: &CommandContext<'_>,
    ) -> Result<OutboundDirective, CommandError>;
}

/// Fixed name → handler table, iterated in sorted order.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands the bot ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(help::Help));
        registry.register(Box::new(status::Status));
        registry.register(Box::new(failed::Failed));
        registry.register(Box::new(transform::Transform));
        registry
    }

    /// Adds `handler`; returns false and keeps the existing entry if the name is taken.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> bool {
        let name = handler.name();
        if self.handlers.contains_key(name) {
            tracing::warn!("Command '{}' is already registered, ignoring duplicate", name);
            return false;
        }
        self.handlers.insert(name, handler);
        true
    }

    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Exactly `N` positional arguments, or an arity error naming them.
pub(crate) fn expect_args<'a, const N: usize>(
    command: &'static str,
    names: &'static str,
    args: &'a [String],
) -> Result<[&'a str; N], CommandError> {
    if args.len() != N {
        return Err(CommandError::Arity {
            command,
            expected: N,
            names,
            got: args.len(),
        });
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}
