//! Job store for the TuneDrop bot.
//!
//! The single shared mutable structure across concurrent job pipelines:
//! an in-memory registry of active (non-terminal) jobs keyed by track id.

pub mod store;

pub use store::{BeginError, JobStore};
