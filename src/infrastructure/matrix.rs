//! # Matrix Service Adapter
//!
//! Implements the `MessageChannel` trait for the Matrix protocol using the `matrix_sdk`.
//! The SDK drives its own sync loop; received text messages are queued on an
//! in-memory channel and handed to the worker each time it polls.

use async_trait::async_trait;
use matrix_sdk::{
    Client,
    attachment::AttachmentConfig,
    config::SyncSettings,
    room::Room,
    ruma::{
        RoomId, UserId,
        events::room::{
            member::{MembershipState, StrippedRoomMemberEvent},
            message::{MessageType, RoomMessageEventContent, SyncRoomMessageEvent},
        },
    },
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, mpsc};

use crate::domain::errors::ChannelError;
use crate::domain::traits::MessageChannel;
use crate::domain::types::{Attachment, FileMetadata, IncomingEvent};

pub struct MatrixService {
    user_id: String,
    password: String,
    homeserver: Option<String>,
    client: Option<Client>,
    inbox_tx: mpsc::UnboundedSender<IncomingEvent>,
    inbox: Mutex<mpsc::UnboundedReceiver<IncomingEvent>>,
}

impl MatrixService {
    pub fn new(user_id: String, password: String, homeserver: Option<String>) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        Self {
            user_id,
            password,
            homeserver,
            client: None,
            inbox_tx,
            inbox: Mutex::new(inbox),
        }
    }

    fn room(&self, channel: &str) -> Result<Room, ChannelError> {
        let client = self.client.as_ref().ok_or_else(|| ChannelError::Send {
            channel: channel.to_string(),
            message: "not connected".to_string(),
        })?;
        let room_id =
            RoomId::parse(channel).map_err(|_| ChannelError::UnknownChannel(channel.to_string()))?;
        client
            .get_room(&room_id)
            .ok_or_else(|| ChannelError::UnknownChannel(channel.to_string()))
    }

    fn register_handlers(&self, client: &Client) {
        // Anything sent before we connected is history, not a request.
        let start_time = SystemTime::now();
        let inbox = self.inbox_tx.clone();

        client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
            let inbox = inbox.clone();
            async move {
                let Some(original_msg) = ev.as_original() else {
                    return;
                };
                let ts = ev.origin_server_ts();
                let event_time = UNIX_EPOCH + Duration::from_millis(ts.get().into());
                if event_time < start_time {
                    return;
                }
                if original_msg.sender == room.own_user_id() {
                    return;
                }

                let own_id = room.own_user_id().to_owned();
                let text = match &original_msg.content.msgtype {
                    MessageType::Text(text_content) => {
                        let formatted = text_content.formatted.as_ref().map(|f| f.body.as_str());
                        let mentioned = original_msg
                            .content
                            .mentions
                            .as_ref()
                            .is_some_and(|m| m.user_ids.contains(&own_id))
                            || formatted.is_some_and(|html| html.contains(own_id.as_str()));
                        let display_name = if mentioned && !text_content.body.contains(own_id.as_str()) {
                            room.get_member_no_sync(&own_id)
                                .await
                                .ok()
                                .flatten()
                                .and_then(|member| member.display_name().map(str::to_string))
                        } else {
                            None
                        };
                        Some(mention_text(
                            &text_content.body,
                            own_id.as_str(),
                            mentioned,
                            display_name.as_deref(),
                        ))
                    }
                    _ => None,
                };
                tracing::debug!(
                    "Received message from {} in {}",
                    original_msg.sender,
                    room.room_id()
                );
                let _ = inbox.send(IncomingEvent {
                    text,
                    channel: room.room_id().to_string(),
                });
            }
        });

        client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
            if ev.content.membership == MembershipState::Invite {
                tracing::info!("Received invite for room {}", room.room_id());
                if let Err(e) = room.join().await {
                    tracing::error!("Failed to join room after invite: {}", e);
                }
            }
        });
    }
}

#[async_trait]
impl MessageChannel for MatrixService {
    async fn connect(&mut self) -> Result<(), ChannelError> {
        let user_id = UserId::parse(self.user_id.as_str())
            .map_err(|e| ChannelError::Connect(format!("Invalid bot id {}: {}", self.user_id, e)))?;

        let builder = Client::builder();
        let builder = match &self.homeserver {
            Some(url) => builder.homeserver_url(url),
            None => builder.server_name(user_id.server_name()),
        };
        let client = builder
            .build()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        client
            .matrix_auth()
            .login_username(user_id.as_str(), &self.password)
            .initial_device_display_name("opsbot")
            .send()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        tracing::info!("Logged in as {}", user_id);

        self.register_handlers(&client);

        let sync_client = client.clone();
        tokio::spawn(async move {
            if let Err(e) = sync_client.sync(SyncSettings::default()).await {
                tracing::error!("Matrix sync stopped: {}", e);
            }
        });

        self.client = Some(client);
        Ok(())
    }

    async fn poll_events(&self) -> Result<Vec<IncomingEvent>, ChannelError> {
        let mut inbox = self.inbox.lock().await;
        let mut events = Vec::new();
        while let Ok(event) = inbox.try_recv() {
            events.push(event);
        }
        Ok(events)
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<String, ChannelError> {
        let room = self.room(channel)?;
        let body = render_message(text, attachments);
        tracing::info!("Bot sending message to {}: {}", channel, body);
        room.send(RoomMessageEventContent::text_markdown(body))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| ChannelError::Send {
                channel: channel.to_string(),
                message: e.to_string(),
            })
    }

    async fn post_file(
        &self,
        channel: &str,
        content: &[u8],
        metadata: &FileMetadata,
    ) -> Result<String, ChannelError> {
        let room = self.room(channel)?;
        let content_type: mime::Mime = metadata
            .mime_type
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);
        tracing::info!(
            "Bot uploading {} ({}, {} bytes) to {}",
            metadata.filename,
            content_type,
            content.len(),
            channel
        );
        room.send_attachment(
            metadata.filename.clone(),
            &content_type,
            content.to_vec(),
            AttachmentConfig::new(),
        )
        .await
        .map(|resp| resp.event_id.to_string())
        .map_err(|e| ChannelError::Send {
            channel: channel.to_string(),
            message: e.to_string(),
        })
    }
}

/// Plain body with the bot's mention spelled as its user id.
///
/// Clients that insert a mention pill put the display name in `body` and the
/// user id only in the formatted body or `m.mentions`.
pub fn mention_text(body: &str, own_id: &str, mentioned: bool, display_name: Option<&str>) -> String {
    if !mentioned || body.contains(own_id) {
        return body.to_string();
    }
    match display_name.and_then(|name| body.split_once(name)) {
        Some((before, after)) => {
            let after = after.strip_prefix(':').unwrap_or(after);
            format!("{before}{own_id}{after}")
        }
        None => format!("{own_id} {body}"),
    }
}

/// Markdown body for a message. Matrix has no attachment blocks, so each
/// attachment becomes a bold title followed by its image.
pub fn render_message(text: &str, attachments: &[Attachment]) -> String {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(text.to_string());
    }
    for attachment in attachments {
        let mut block = format!("**{}**", attachment.title);
        if let Some(url) = &attachment.image_url {
            block.push_str(&format!("\n![{}]({})", attachment.fallback, url));
        }
        parts.push(block);
    }
    parts.join("\n\n")
}
