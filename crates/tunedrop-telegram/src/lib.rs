//! Conversation gateway over the Telegram Bot API.
//!
//! The [`Gateway`] trait is the abstract send/edit/answer surface the
//! lifecycle controller talks through; [`TelegramGateway`] implements it
//! with reqwest against `api.telegram.org`. Nothing here knows about
//! media semantics.

pub mod api;
pub mod error;
pub mod gateway;
pub mod types;

pub use api::TelegramGateway;
pub use error::{TransportError, TransportResult};
pub use gateway::{AudioMessage, Button, Gateway, InlineKeyboard};
pub use types::{CallbackQuery, Chat, ChatId, Message, MessageId, PhotoSize, Update, User};
