//! Container image reference handling

pub mod reference;

pub use reference::{DEFAULT_VERSION, ImageReference, NAMESPACE_SENTINEL, ReferenceError};
