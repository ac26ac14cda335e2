//! Media resolution, acquisition, and tag embedding for TuneDrop.
//!
//! Wraps the external `yt-dlp` tool behind the [`Resolver`] trait and the
//! `audiotags` crate behind the [`Tagger`] trait. Both are pure
//! request/result seams; neither holds job state.

pub mod error;
pub mod resolver;
pub mod tag;
pub mod ytdlp;

pub use error::{MediaError, MediaResult};
pub use resolver::{FetchedAudio, Resolver};
pub use tag::{Id3Tagger, Tagger};
pub use ytdlp::YtDlpResolver;
