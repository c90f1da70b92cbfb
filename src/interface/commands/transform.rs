//! # Transform Command
//!
//! Replies with a fixed image attachment.

use async_trait::async_trait;

use super::{CommandContext, CommandHandler};
use crate::domain::errors::CommandError;
use crate::domain::types::{Attachment, OutboundDirective};
use crate::strings::messages;

pub struct Transform;

#[async_trait]
impl CommandHandler for Transform {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn usage(&self) -> &'static str {
        crate::strings::help::TRANSFORM
    }

    async fn handle(
        &self,
        _args: &[String],
        _ctx: &CommandContext<'_>,
    ) -> Result<OutboundDirective, CommandError> {
        Ok(OutboundDirective::attachments(vec![Attachment {
            fallback: messages::TRANSFORM_TITLE.to_string(),
            title: messages::TRANSFORM_TITLE.to_string(),
            image_url: Some(messages::TRANSFORM_URL.to_string()),
            color: Some(messages::TRANSFORM_COLOR.to_string()),
        }]))
    }
}
