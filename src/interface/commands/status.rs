//! # Status Command
//!
//! Handles `status <cluster>`: job counts by status on a Mozart cluster.

use async_trait::async_trait;

use super::{CommandContext, CommandHandler, expect_args};
use crate::domain::errors::CommandError;
use crate::domain::types::OutboundDirective;
use crate::strings::messages;

pub struct Status;

#[async_trait]
impl CommandHandler for Status {
    fn name(&self) -> &'static str {
        "status"
    }

    fn usage(&self) -> &'static str {
        crate::strings::help::STATUS
    }

    async fn handle(
        &self,
        args: &[String],
        ctx: &CommandContext<'_>,
    ) -> Result<OutboundDirective, CommandError> {
        let [cluster] = expect_args(self.name(), "cluster", args)?;

        let Some(url) = ctx.settings.index_url(cluster) else {
            return Ok(OutboundDirective::text(messages::no_configuration(cluster)));
        };

        let counts = ctx.index.job_counts(url).await?;
        Ok(OutboundDirective::text(messages::job_status_report(
            cluster, &counts,
        )))
    }
}
