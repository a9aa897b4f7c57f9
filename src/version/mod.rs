//! Version resolution layer for container images
//!
//! This module provides the core functionality for listing image tags across
//! registries and picking the newest comparable release.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │────▶│ RegistrySet │────▶│  Registries │
//! │ (decision)  │     │ (dispatch)  │     │ (oci, hub)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   Semver    │
//! │(extract/cmp)│
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: `TagRegistry` trait and request/response types
//! - [`registries`]: Concrete registry implementations and host dispatch
//! - [`resolver`]: Per-container update decision
//! - [`semver`]: Version extraction and comparison
//! - [`error`]: Error types for registry calls and skipped containers

pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
