//! Request lifecycle controller.
//!
//! Classifies inbound updates (commands, plain text, button activations)
//! and drives the resolver, job store, and gateway. Long-running work is
//! handed off to a per-job [`Pipeline`] task so intake never blocks.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use tunedrop_jobs::{BeginError, JobStore};
use tunedrop_media::{MediaError, Resolver, Tagger};
use tunedrop_models::{
    is_media_link, BitrateClass, Candidate, SelectionToken, TrackId,
};
use tunedrop_telegram::{
    Button, CallbackQuery, ChatId, Gateway, InlineKeyboard, Message, Update,
};

use crate::config::BotConfig;
use crate::messages;
use crate::pipeline::{Pipeline, ProgressMessage};

/// The lifecycle controller. Cheap to share; one instance serves all
/// chats concurrently.
pub struct BotController {
    gateway: Arc<dyn Gateway>,
    resolver: Arc<dyn Resolver>,
    tagger: Arc<dyn Tagger>,
    store: Arc<JobStore>,
    config: BotConfig,
    http: reqwest::Client,
}

/// Three bitrate buttons, one per row, each carrying a complete
/// `download` token.
fn quality_keyboard(track: &TrackId) -> InlineKeyboard {
    let rows = BitrateClass::ALL
        .iter()
        .map(|bitrate| {
            vec![Button::callback(
                messages::bitrate_button_label(*bitrate),
                SelectionToken::Download(track.clone(), *bitrate).encode(),
            )]
        })
        .collect();
    InlineKeyboard::from_rows(rows)
}

/// One button per search result, each carrying a `pick` token.
fn results_keyboard(candidates: &[Candidate]) -> InlineKeyboard {
    let rows = candidates
        .iter()
        .map(|candidate| {
            vec![Button::callback(
                messages::result_button_label(candidate),
                SelectionToken::Pick(candidate.id.clone()).encode(),
            )]
        })
        .collect();
    InlineKeyboard::from_rows(rows)
}

impl BotController {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        resolver: Arc<dyn Resolver>,
        tagger: Arc<dyn Tagger>,
        store: Arc<JobStore>,
        config: BotConfig,
    ) -> Self {
        Self {
            gateway,
            resolver,
            tagger,
            store,
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Entry point for one inbound update. Infallible by design: every
    /// failure is handled (told to the user or logged) right here.
    pub async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let text = text.trim();
        let chat = message.chat.id;

        // The command is the first whitespace-delimited word, matched
        // exactly: "/searchable" is plain text, not /search
        let (command, args) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(command, args)| (command, args.trim()));

        match command {
            "/start" => {
                let first_name = message
                    .from
                    .map(|user| user.first_name)
                    .unwrap_or_else(|| "there".to_string());
                self.cmd_start(chat, &first_name).await;
            }
            "/help" => self.send_text(chat, messages::HELP_TEXT, None).await,
            "/search" => self.cmd_search(chat, args).await,
            _ => self.handle_plain_text(chat, text).await,
        }
    }

    async fn cmd_start(&self, chat: ChatId, first_name: &str) {
        let keyboard = InlineKeyboard::from_rows(vec![
            vec![Button::url(
                "💬 Contact Creator",
                self.config.creator_url.clone(),
            )],
            vec![Button::callback("ℹ️ Help", SelectionToken::Help.encode())],
        ]);
        let caption = messages::welcome(first_name);

        // Photo welcome, with a plain-text fallback if the image cannot
        // be fetched or sent
        if let Some(image) = self.fetch_image(&self.config.welcome_image_url).await {
            match self
                .gateway
                .send_photo_with_caption(chat, image, &caption, Some(keyboard.clone()))
                .await
            {
                Ok(_) => return,
                Err(e) => warn!(chat = %chat, error = %e, "welcome photo failed, falling back to text"),
            }
        }
        self.send_text(chat, &caption, Some(keyboard)).await;
    }

    async fn cmd_search(&self, chat: ChatId, query: &str) {
        if query.is_empty() {
            self.send_text(chat, messages::SEARCH_USAGE, None).await;
            return;
        }

        self.send_text(chat, &messages::searching(query), None).await;

        match self.resolver.search(query, self.config.search_limit).await {
            Ok(candidates) if candidates.is_empty() => {
                // Successful but empty: "no matches", not an error
                self.send_text(chat, messages::NO_RESULTS, None).await;
            }
            Ok(candidates) => {
                info!(chat = %chat, query, results = candidates.len(), "presenting search results");
                let keyboard = results_keyboard(&candidates);
                self.send_text(chat, messages::PICK_PROMPT, Some(keyboard))
                    .await;
            }
            Err(e) => {
                error!(chat = %chat, query, error = %e, "search failed");
                self.send_text(chat, messages::SEARCH_FAILED, None).await;
            }
        }
    }

    async fn handle_plain_text(&self, chat: ChatId, text: &str) {
        if !is_media_link(text) {
            self.send_text(chat, messages::NOT_A_LINK, None).await;
            return;
        }

        self.send_text(chat, messages::PROCESSING_LINK, None).await;

        match self.resolver.resolve_direct(text).await {
            Ok(candidate) => {
                // The link already pins down one candidate, so the first
                // disambiguation step is skipped
                self.present_quality_options(chat, candidate).await;
            }
            Err(MediaError::InvalidLink(e)) => {
                debug!(chat = %chat, error = %e, "rejected link");
                self.send_text(chat, messages::NOT_A_LINK, None).await;
            }
            Err(e) => {
                error!(chat = %chat, error = %e, "direct resolution failed");
                self.send_text(chat, messages::LINK_FAILED, None).await;
            }
        }
    }

    async fn present_quality_options(&self, chat: ChatId, candidate: Candidate) {
        let keyboard = quality_keyboard(&candidate.id);
        let caption = messages::quality_caption(&candidate.title);

        if let Some(url) = &candidate.thumbnail_url {
            if let Some(image) = self.fetch_image(url).await {
                match self
                    .gateway
                    .send_photo_with_caption(chat, image, &caption, Some(keyboard.clone()))
                    .await
                {
                    Ok(_) => return,
                    Err(e) => {
                        warn!(chat = %chat, error = %e, "thumbnail message failed, falling back to text")
                    }
                }
            }
        }
        self.send_text(chat, &caption, Some(keyboard)).await;
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        // Always acknowledged, even if the rest fails, so the button does
        // not spin forever
        if let Err(e) = self.gateway.answer_callback(&callback.id).await {
            warn!(callback = %callback.id, error = %e, "failed to answer callback query");
        }

        let Some(data) = callback.data.as_deref() else {
            return;
        };
        let token = match data.parse::<SelectionToken>() {
            Ok(token) => token,
            Err(e) => {
                warn!(data, error = %e, "rejected malformed selection token");
                return;
            }
        };
        let Some(message) = callback.message else {
            warn!(callback = %callback.id, "callback without originating message");
            return;
        };
        let progress = ProgressMessage {
            chat: message.chat.id,
            message: message.message_id,
            is_photo: message.is_photo(),
        };

        match token {
            SelectionToken::Help => self.show_help(progress).await,
            SelectionToken::Pick(track) => {
                // Second disambiguation step: candidate chosen, bitrate next
                if let Err(e) = self
                    .gateway
                    .edit_text(
                        progress.chat,
                        progress.message,
                        messages::QUALITY_PROMPT,
                        Some(quality_keyboard(&track)),
                    )
                    .await
                {
                    warn!(chat = %progress.chat, error = %e, "failed to present quality options");
                }
            }
            SelectionToken::Download(track, bitrate) => {
                self.start_download(progress, track, bitrate).await;
            }
        }
    }

    async fn show_help(&self, progress: ProgressMessage) {
        // The welcome message is a photo, so the caption is what gets
        // replaced; text edit covers the fallback welcome
        let result = if progress.is_photo {
            self.gateway
                .edit_caption(progress.chat, progress.message, messages::HELP_TEXT, None)
                .await
        } else {
            self.gateway
                .edit_text(progress.chat, progress.message, messages::HELP_TEXT, None)
                .await
        };
        if let Err(e) = result {
            warn!(chat = %progress.chat, error = %e, "failed to show help");
        }
    }

    async fn start_download(
        &self,
        progress: ProgressMessage,
        track: TrackId,
        bitrate: BitrateClass,
    ) {
        match self.store.begin(track.clone(), bitrate) {
            Ok(job) => {
                info!(
                    job_id = %job.id,
                    track = %track,
                    kbps = bitrate.kbps(),
                    "job accepted"
                );
                let pipeline = Pipeline::new(
                    Arc::clone(&self.gateway),
                    Arc::clone(&self.resolver),
                    Arc::clone(&self.tagger),
                    Arc::clone(&self.store),
                    self.config.downloads_dir.clone(),
                );
                tokio::spawn(async move {
                    pipeline.run(job, progress).await;
                });
            }
            Err(BeginError::AlreadyActive) => {
                // Expected on rapid double-taps; not an error
                debug!(track = %track, "duplicate download rejected");
                let result = if progress.is_photo {
                    self.gateway
                        .edit_caption(
                            progress.chat,
                            progress.message,
                            messages::ALREADY_IN_PROGRESS,
                            None,
                        )
                        .await
                } else {
                    self.gateway
                        .edit_text(
                            progress.chat,
                            progress.message,
                            messages::ALREADY_IN_PROGRESS,
                            None,
                        )
                        .await
                };
                if let Err(e) = result {
                    warn!(chat = %progress.chat, error = %e, "failed to report duplicate job");
                }
            }
        }
    }

    /// Best-effort text send; transport failures outside delivery are
    /// logged and the flow continues.
    async fn send_text(&self, chat: ChatId, text: &str, keyboard: Option<InlineKeyboard>) {
        if let Err(e) = self.gateway.send_text(chat, text, keyboard).await {
            warn!(chat = %chat, error = %e, "failed to send message");
        }
    }

    async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url, status = %response.status(), "image fetch refused");
                return None;
            }
            Err(e) => {
                debug!(url, error = %e, "image fetch failed");
                return None;
            }
        };
        response.bytes().await.ok().map(|bytes| bytes.to_vec())
    }
}
