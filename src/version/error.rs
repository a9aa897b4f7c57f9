use thiserror::Error;

use crate::image::ReferenceError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Token endpoint {0} returned no token")]
    MissingToken(String),
}

/// Why a container produced no update decision
///
/// None of these abort sibling containers or files.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("Image is invalid: {0}")]
    InvalidReference(#[from] ReferenceError),

    #[error("Update is disabled")]
    UpdateDisabled,

    #[error("Could not parse a comparable version from '{0}'")]
    UnparsableVersion(String),

    #[error("Registry request failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("No tags found")]
    NoTags,

    #[error("No newer version than {0}")]
    NoNewerVersion(String),
}

impl SkipReason {
    /// Log level matching how actionable the skip is for the user
    pub fn level(&self) -> tracing::Level {
        match self {
            SkipReason::UpdateDisabled => tracing::Level::INFO,
            SkipReason::NoNewerVersion(_) => tracing::Level::DEBUG,
            SkipReason::InvalidReference(_) | SkipReason::UnparsableVersion(_) => {
                tracing::Level::WARN
            }
            SkipReason::Registry(_) | SkipReason::NoTags => tracing::Level::ERROR,
        }
    }
}
