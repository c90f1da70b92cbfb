//! # Failed Command
//!
//! Handles `failed <job_type> <cluster>`: the most recent failed job of a type.

use async_trait::async_trait;

use super::{CommandContext, CommandHandler, expect_args};
use crate::domain::errors::CommandError;
use crate::domain::types::OutboundDirective;
use crate::strings::messages;

pub struct Failed;

#[async_trait]
impl CommandHandler for Failed {
    fn name(&self) -> &'static str {
        "failed"
    }

    fn usage(&self) -> &'static str {
        crate::strings::help::FAILED
    }

    async fn handle(
        &self,
        args: &[String],
        ctx: &CommandContext<'_>,
    ) -> Result<OutboundDirective, CommandError> {
        let [job_type, cluster] = expect_args(self.name(), "job_type, cluster", args)?;

        let Some(url) = ctx.settings.index_url(cluster) else {
            return Ok(OutboundDirective::text(messages::no_configuration(cluster)));
        };

        let reply = match ctx.index.last_failed_job(url, job_type).await? {
            Some(job) => messages::failed_job_report(job_type, cluster, &job),
            None => messages::no_failed_job(job_type, cluster),
        };
        Ok(OutboundDirective::text(reply))
    }
}
