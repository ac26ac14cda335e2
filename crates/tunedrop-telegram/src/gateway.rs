//! Abstract conversation surface used by the lifecycle controller.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::TransportResult;
use crate::types::{ChatId, Message, MessageId};

/// One inline keyboard button. Serializes to the Bot API shape.
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl Button {
    /// Button that fires a callback query carrying `data` on activation.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// Button that opens a URL.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Inline keyboard attached to an outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboard {
    inline_keyboard: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    pub fn from_rows(rows: Vec<Vec<Button>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }
}

/// A finished audio artifact ready for delivery.
#[derive(Debug, Clone)]
pub struct AudioMessage {
    pub path: PathBuf,
    pub title: String,
    pub performer: String,
    pub caption: String,
}

/// Abstract one-shot conversation operations against the transport.
///
/// Callers decide fatality: the lifecycle controller logs and continues on
/// most transport errors, but a failed final `send_audio` fails the job.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<Message>;

    async fn send_photo_with_caption(
        &self,
        chat: ChatId,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<Message>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<()>;

    async fn edit_caption(
        &self,
        chat: ChatId,
        message: MessageId,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<()>;

    /// Must be called for every activation, even when the ensuing work
    /// fails, so the button does not appear stuck.
    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> TransportResult<()>;

    async fn send_audio(&self, chat: ChatId, audio: AudioMessage) -> TransportResult<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_serializes_to_bot_api_shape() {
        let keyboard = InlineKeyboard::from_rows(vec![
            vec![Button::url("💬 Contact", "https://t.me/someone")],
            vec![Button::callback("ℹ️ Help", "help")],
        ]);
        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inline_keyboard": [
                    [{"text": "💬 Contact", "url": "https://t.me/someone"}],
                    [{"text": "ℹ️ Help", "callback_data": "help"}]
                ]
            })
        );
    }
}
