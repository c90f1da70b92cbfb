//! # Delivery
//!
//! Sends an `OutboundDirective` with exactly one transport call.

use crate::domain::errors::ChannelError;
use crate::domain::traits::MessageChannel;
use crate::domain::types::OutboundDirective;

pub async fn deliver<C>(
    chat: &C,
    channel: &str,
    directive: &OutboundDirective,
) -> Result<String, ChannelError>
where
    C: MessageChannel + ?Sized,
{
    match directive {
        OutboundDirective::PostMessage { text, attachments } => {
            chat.post_message(channel, text, attachments).await
        }
        OutboundDirective::PostFile { content, metadata } => {
            chat.post_file(channel, content, metadata).await
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeChannel, Sent};
    use super::*;
    use crate::domain::types::{Attachment, FileMetadata};

    fn report() -> OutboundDirective {
        OutboundDirective::PostFile {
            content: b"job-ingest,failed\n".to_vec(),
            metadata: FileMetadata {
                filename: "failed.csv".to_string(),
                mime_type: "text/csv".to_string(),
                title: None,
            },
        }
    }

    #[tokio::test]
    async fn test_message_maps_to_post_message() {
        let chat = FakeChannel::default();
        let attachment = Attachment {
            fallback: "f".to_string(),
            title: "t".to_string(),
            image_url: None,
            color: None,
        };
        let directive = OutboundDirective::PostMessage {
            text: "hello".to_string(),
            attachments: vec![attachment.clone()],
        };

        let id = deliver(&chat, "!ops:example.org", &directive).await.unwrap();
        assert_eq!(id, "$event1");
        assert_eq!(
            chat.sent(),
            vec![Sent::Message {
                channel: "!ops:example.org".to_string(),
                text: "hello".to_string(),
                attachments: vec![attachment],
            }]
        );
    }

    #[tokio::test]
    async fn test_file_maps_to_post_file() {
        let chat = FakeChannel {
            supports_files: true,
            ..Default::default()
        };
        deliver(&chat, "!ops:example.org", &report()).await.unwrap();
        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::File { metadata, .. } if metadata.filename == "failed.csv"));
    }

    #[tokio::test]
    async fn test_file_on_text_only_transport_is_unsupported() {
        let chat = FakeChannel::default();
        let err = deliver(&chat, "!ops:example.org", &report()).await.unwrap_err();
        assert!(matches!(err, ChannelError::UnsupportedDirective("post_file")));
        assert!(chat.sent().is_empty());
    }
}
