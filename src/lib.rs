//! Keeps declarative container image definitions up to date.
//!
//! # Modules
//!
//! - [`config`]: Immutable configuration snapshot and per-image overrides
//! - [`image`]: Image reference parsing
//! - [`version`]: Version extraction, registry clients and update resolution
//! - [`pipeline`]: Per-file update pipeline, history collaborator and orchestrator
//! - [`logging`]: Tracing subscriber setup for the binary

pub mod config;
pub mod image;
pub mod logging;
pub mod pipeline;
pub mod version;
