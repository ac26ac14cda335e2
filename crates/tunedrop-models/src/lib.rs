//! Shared data models for the TuneDrop bot.
//!
//! This crate provides Serde-serializable types for:
//! - Resolved media candidates and their opaque track identifiers
//! - Audio bitrate classes
//! - Self-describing selection tokens carried by inline buttons
//! - Acquisition jobs and their legal status transitions
//! - YouTube link parsing

pub mod bitrate;
pub mod job;
pub mod link;
pub mod token;
pub mod track;

// Re-export common types
pub use bitrate::{BitrateClass, BitrateParseError};
pub use job::{Job, JobId, JobStatus};
pub use link::{extract_track_id, is_media_link, LinkError};
pub use token::{SelectionToken, TokenParseError};
pub use track::{Candidate, TrackId, TrackIdError};
