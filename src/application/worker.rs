//! # Worker
//!
//! The polling loop: read events from the transport, route mentions, deliver
//! each reply. Failures are logged and the loop moves on to the next event.

use std::future::Future;
use std::time::Duration;

use crate::application::delivery;
use crate::application::router::CommandRouter;
use crate::domain::errors::ChannelError;
use crate::domain::traits::MessageChannel;
use crate::strings::logs;

pub struct Worker<'a, C: MessageChannel + ?Sized> {
    chat: &'a C,
    router: &'a CommandRouter,
    interval: Duration,
}

impl<'a, C: MessageChannel + ?Sized> Worker<'a, C> {
    pub fn new(chat: &'a C, router: &'a CommandRouter, interval: Duration) -> Self {
        Self {
            chat,
            router,
            interval,
        }
    }

    /// Handle every event from one poll, in arrival order.
    /// Returns how many replies were delivered.
    pub async fn poll_once(&self) -> usize {
        let events = match self.chat.poll_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Polling the channel failed: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for event in events {
            let Some(command) = self.router.command_for(&event) else {
                continue;
            };
            let directive = self.router.dispatch(&event.channel, &command).await;

            match delivery::deliver(self.chat, &event.channel, &directive).await {
                Ok(id) => {
                    delivered += 1;
                    tracing::info!("{}", logs::reply_sent(&event.channel, directive.kind(), &id));
                }
                Err(ChannelError::UnsupportedDirective(kind)) => {
                    // A handler produced something this transport cannot send.
                    tracing::error!(
                        "Transport cannot deliver '{}' replies (channel {})",
                        kind,
                        event.channel
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to deliver reply to {}: {}", event.channel, e);
                }
            }
        }
        delivered
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            self.poll_once().await;
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    tracing::info!("{}", logs::SHUTDOWN);
                    break;
                }
            }
        }
    }
}
