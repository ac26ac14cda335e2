//! TuneDrop bot: the request lifecycle controller and its collaborators.
//!
//! Inbound updates are classified by [`BotController`]; each accepted
//! download runs as its own [`pipeline::Pipeline`] task against the shared
//! job store, so event intake is never blocked by a long-running fetch.

pub mod config;
pub mod controller;
pub mod health;
pub mod messages;
pub mod pipeline;

pub use config::{BotConfig, ConfigError};
pub use controller::BotController;
pub use pipeline::{Pipeline, PipelineError};
