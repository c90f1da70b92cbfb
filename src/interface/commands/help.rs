//! # Help Command
//!
//! Handles the `help` command.
//! Lists every registered command name.

use async_trait::async_trait;

use super::{CommandContext, CommandHandler};
use crate::domain::errors::CommandError;
use crate::domain::types::OutboundDirective;
use crate::strings::messages;

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn usage(&self) -> &'static str {
        crate::strings::help::HELP
    }

    async fn handle(
        &self,
        _args: &[String],
        ctx: &CommandContext<'_>,
    ) -> Result<OutboundDirective, CommandError> {
        Ok(OutboundDirective::text(messages::help_listing(
            ctx.registry.names(),
        )))
    }
}
