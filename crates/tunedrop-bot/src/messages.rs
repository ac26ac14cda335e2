//! User-facing message texts and formatting helpers.

use tunedrop_models::{BitrateClass, Candidate, TrackId};

/// Longest title shown on a search-result button.
const MAX_BUTTON_TITLE: usize = 35;

pub const HELP_TEXT: &str = "🎵 *TuneDrop Help* 🎵\n\n\
    *Commands:*\n\
    /start - Start the bot\n\
    /help - Show this help message\n\
    /search [query] - Search for music\n\n\
    *How to use:*\n\
    1️⃣ Send a YouTube link to download directly\n\
    2️⃣ Or type /search followed by song name\n\
    3️⃣ Select quality options when prompted";

pub const SEARCH_USAGE: &str =
    "Please provide a search term. Example: /search Bohemian Rhapsody";
pub const NO_RESULTS: &str = "No results found. Try a different search term.";
pub const SEARCH_FAILED: &str = "Search failed. Please try again in a moment.";
pub const PICK_PROMPT: &str = "🎵 Select a song to download:";
pub const QUALITY_PROMPT: &str = "Select audio quality to download:";
pub const NOT_A_LINK: &str = "Please send a valid YouTube link or use /search to find music.";
pub const PROCESSING_LINK: &str = "⏳ Processing your YouTube link...";
pub const LINK_FAILED: &str =
    "Couldn't read that link. Please try again or use /search to find music.";
pub const ALREADY_IN_PROGRESS: &str = "⚠️ That download is already in progress.";
pub const DOWNLOADING: &str = "⏬ Downloading... Please wait...";
pub const SENDING: &str = "✅ Download complete! Sending file...";
pub const FAIL_RESOLUTION: &str =
    "❌ Couldn't look this track up. Please try again later.";
pub const FAIL_DOWNLOAD: &str = "❌ Download failed. Please try again later.";
pub const FAIL_ENCODING: &str =
    "❌ Audio conversion failed. Try a different quality, or try again later.";
pub const FAIL_DELIVERY: &str = "❌ Couldn't send the audio file. Please try again.";

pub fn welcome(first_name: &str) -> String {
    format!(
        "Welcome to TuneDrop, {}! 🎵\n\n\
         Send me a YouTube link or search for a song, and I'll download it \
         for you with high quality audio.",
        escape_markdown(first_name)
    )
}

pub fn searching(query: &str) -> String {
    format!("🔍 Searching for: {}", escape_markdown(query))
}

pub fn starting(bitrate: BitrateClass) -> String {
    format!(
        "⏳ Starting download at {}kbps...\nPlease wait, this may take a moment.",
        bitrate.kbps()
    )
}

/// Caption on the quality-selection message for a directly resolved link.
pub fn quality_caption(title: &str) -> String {
    format!("🎵 *{}*\n\nSelect audio quality to download:", escape_markdown(title))
}

/// Label for one search-result button: truncated title plus duration.
pub fn result_button_label(candidate: &Candidate) -> String {
    format!(
        "{} ({})",
        truncate_title(&candidate.title),
        format_duration(candidate.duration_secs)
    )
}

pub fn bitrate_button_label(bitrate: BitrateClass) -> String {
    format!("🎵 MP3 ({}kbps)", bitrate.kbps())
}

/// Caption delivered with the finished audio file.
pub fn audio_caption(title: &str, bitrate: BitrateClass, track: &TrackId) -> String {
    format!(
        "🎵 *{}*\n💾 Quality: {}kbps\n🔗 [YouTube Link]({})\n\nDownloaded by @TuneDropBot",
        escape_markdown(title),
        bitrate.kbps(),
        track.watch_url()
    )
}

pub fn format_duration(duration_secs: Option<u32>) -> String {
    match duration_secs {
        Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
        None => "Unknown".to_string(),
    }
}

pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_BUTTON_TITLE {
        let head: String = title.chars().take(MAX_BUTTON_TITLE - 3).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Escape the characters Telegram's legacy Markdown mode treats specially.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
