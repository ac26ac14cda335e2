//! Telegram Bot API client.

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::gateway::{AudioMessage, Gateway, InlineKeyboard};
use crate::types::{ChatId, Message, MessageId, Update};

/// Concrete gateway over `api.telegram.org`.
pub struct TelegramGateway {
    client: reqwest::Client,
    base_url: String,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> TransportResult<T> {
        if self.ok {
            self.result
                .ok_or_else(|| TransportError::api("response envelope missing result"))
        } else {
            Err(TransportError::api(
                self.description
                    .unwrap_or_else(|| "unknown api error".to_string()),
            ))
        }
    }
}

impl TelegramGateway {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
        }
    }

    /// Override the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<T> {
        debug!(method, "telegram api call");
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;
        let envelope: ApiResponse<T> = response.json().await?;
        envelope.into_result()
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: multipart::Form,
    ) -> TransportResult<T> {
        debug!(method, "telegram api multipart call");
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiResponse<T> = response.json().await?;
        envelope.into_result()
    }

    /// Long-poll `getUpdates` for messages and callback queries. This is
    /// the inbound half of the transport; it sits outside the [`Gateway`]
    /// trait because the lifecycle controller never polls.
    pub async fn poll_updates(&self, offset: i64, timeout_secs: u64) -> TransportResult<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            // The request blocks server-side for up to `timeout_secs`
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&payload)
            .send()
            .await?;
        let envelope: ApiResponse<Vec<Update>> = response.json().await?;
        envelope.into_result()
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<Message> {
        let mut payload = json!({
            "chat_id": chat,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)?;
        }
        self.call("sendMessage", &payload).await
    }

    async fn send_photo_with_caption(
        &self,
        chat: ChatId,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<Message> {
        let part = multipart::Part::bytes(photo)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")?;
        let mut form = multipart::Form::new()
            .text("chat_id", chat.0.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part("photo", part);
        if let Some(keyboard) = keyboard {
            form = form.text("reply_markup", serde_json::to_string(&keyboard)?);
        }
        self.call_multipart("sendPhoto", form).await
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<()> {
        let mut payload = json!({
            "chat_id": chat,
            "message_id": message,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)?;
        }
        // The API returns the edited Message (or True); neither is needed
        self.call::<serde_json::Value>("editMessageText", &payload)
            .await
            .map(|_| ())
    }

    async fn edit_caption(
        &self,
        chat: ChatId,
        message: MessageId,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> TransportResult<()> {
        let mut payload = json!({
            "chat_id": chat,
            "message_id": message,
            "caption": caption,
            "parse_mode": "Markdown",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)?;
        }
        self.call::<serde_json::Value>("editMessageCaption", &payload)
            .await
            .map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        let payload = json!({ "callback_query_id": callback_id });
        self.call::<serde_json::Value>("answerCallbackQuery", &payload)
            .await
            .map(|_| ())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> TransportResult<()> {
        let payload = json!({ "chat_id": chat, "message_id": message });
        self.call::<serde_json::Value>("deleteMessage", &payload)
            .await
            .map(|_| ())
    }

    async fn send_audio(&self, chat: ChatId, audio: AudioMessage) -> TransportResult<Message> {
        let bytes = tokio::fs::read(&audio.path).await?;
        let file_name = audio
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;
        let form = multipart::Form::new()
            .text("chat_id", chat.0.to_string())
            .text("title", audio.title)
            .text("performer", audio.performer)
            .text("caption", audio.caption)
            .text("parse_mode", "Markdown")
            .part("audio", part);
        self.call_multipart("sendAudio", form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message_result(message_id: i64) -> serde_json::Value {
        json!({
            "ok": true,
            "result": {
                "message_id": message_id,
                "chat": {"id": 5, "type": "private"}
            }
        })
    }

    async fn gateway_for(server: &MockServer) -> TelegramGateway {
        TelegramGateway::new("TEST_TOKEN").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_send_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 5, "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result(10)))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let message = gateway.send_text(ChatId(5), "hello", None).await.unwrap();
        assert_eq!(message.message_id, MessageId(10));
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway
            .send_text(ChatId(5), "hello", None)
            .await
            .unwrap_err();
        match err {
            TransportError::Api { description } => {
                assert!(description.contains("chat not found"))
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_answer_callback_accepts_bool_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/answerCallbackQuery"))
            .and(body_partial_json(json!({"callback_query_id": "cb-1"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        gateway.answer_callback("cb-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_edit_text_with_keyboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/editMessageText"))
            .and(body_partial_json(json!({
                "chat_id": 5,
                "message_id": 10,
                "reply_markup": {"inline_keyboard": [[{"text": "go", "callback_data": "help"}]]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result(10)))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let keyboard =
            InlineKeyboard::from_rows(vec![vec![crate::gateway::Button::callback("go", "help")]]);
        gateway
            .edit_text(ChatId(5), MessageId(10), "edited", Some(keyboard))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_audio_uploads_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result(11)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("track.mp3");
        std::fs::write(&audio_path, b"not really mp3 bytes").unwrap();

        let gateway = gateway_for(&server).await;
        let message = gateway
            .send_audio(
                ChatId(5),
                AudioMessage {
                    path: audio_path,
                    title: "Title".to_string(),
                    performer: "Performer".to_string(),
                    caption: "caption".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(message.message_id, MessageId(11));
    }

    #[tokio::test]
    async fn test_send_audio_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let gateway = gateway_for(&server).await;
        let err = gateway
            .send_audio(
                ChatId(5),
                AudioMessage {
                    path: "/nonexistent/track.mp3".into(),
                    title: String::new(),
                    performer: String::new(),
                    caption: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[tokio::test]
    async fn test_poll_updates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getUpdates"))
            .and(body_partial_json(json!({"offset": 7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 7,
                        "message": {
                            "message_id": 1,
                            "chat": {"id": 5, "type": "private"},
                            "text": "/start"
                        }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let updates = gateway.poll_updates(7, 1).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 7);
    }
}
