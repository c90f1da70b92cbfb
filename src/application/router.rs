//! # Command Router
//!
//! Routes mentions of the bot to the matching command handler (in `interface/commands`).
//! Whatever the handler does (succeed, return an error, or panic) the router
//! comes back with a directive, so one bad command never takes the bot down.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::application::parsing::{self, ParsedCommand};
use crate::domain::config::Settings;
use crate::domain::traits::JobIndex;
use crate::domain::types::{IncomingEvent, OutboundDirective};
use crate::interface::commands::{CommandContext, CommandRegistry};
use crate::strings::{logs, messages};

pub struct CommandRouter {
    settings: Arc<Settings>,
    registry: Arc<CommandRegistry>,
    index: Arc<dyn JobIndex>,
    marker: String,
}

impl CommandRouter {
    /// `bot_id` is the bot's own user id; messages containing it are mentions.
    pub fn new(
        settings: Arc<Settings>,
        registry: Arc<CommandRegistry>,
        index: Arc<dyn JobIndex>,
        bot_id: &str,
    ) -> Self {
        Self {
            settings,
            registry,
            index,
            marker: bot_id.trim().to_string(),
        }
    }

    /// The command text of `event`, if it is addressed to the bot.
    pub fn command_for(&self, event: &IncomingEvent) -> Option<String> {
        parsing::extract_mention(event.text.as_deref()?, &self.marker)
    }

    /// Run `command` and describe the reply.
    pub async fn dispatch(&self, channel: &str, command: &str) -> OutboundDirective {
        let ParsedCommand { name, args } = match parsing::tokenize(command) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return OutboundDirective::text(messages::UNKNOWN_COMMAND),
            Err(e) => return self.unparseable(command, &e),
        };
        tracing::info!("{}", logs::dispatching(channel, &name, &args));

        let Some(handler) = self.registry.get(&name) else {
            return OutboundDirective::text(messages::UNKNOWN_COMMAND);
        };

        let ctx = CommandContext {
            settings: &self.settings,
            registry: &self.registry,
            index: self.index.as_ref(),
        };

        let outcome = AssertUnwindSafe(handler.handle(&args, &ctx))
            .catch_unwind()
            .await;

        let err = match outcome {
            Ok(Ok(directive)) => return directive,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };
        tracing::warn!("Command '{}' failed: {}", name, err);
        OutboundDirective::text(messages::command_error(&err, handler.usage()))
    }

    /// Bad quoting only counts as a command error when the first word names a command.
    fn unparseable(&self, command: &str, err: &shell_words::ParseError) -> OutboundDirective {
        let first = command.split_whitespace().next().unwrap_or_default();
        let Some(handler) = self.registry.get(first) else {
            return OutboundDirective::text(messages::UNKNOWN_COMMAND);
        };
        tracing::warn!("Could not parse '{}': {}", command, err);
        OutboundDirective::text(messages::command_error(&err.to_string(), handler.usage()))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
