//! Image reference parser
//!
//! Splits strings of the form `[registry/][namespace/]repository[:version]`
//! into their parts.

use std::fmt;
use std::str::FromStr;

/// Namespace used when the reference carries none
pub const NAMESPACE_SENTINEL: &str = "_";

/// Version used when the reference carries no tag
pub const DEFAULT_VERSION: &str = "latest";

/// Error returned for references that cannot be segmented
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("image reference '{0}' has more than 3 path segments")]
    TooManySegments(String),

    #[error("image reference '{0}' has an empty path segment")]
    EmptySegment(String),
}

/// A parsed container image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, e.g. `ghcr.io`
    pub registry: Option<String>,
    /// Namespace, [`NAMESPACE_SENTINEL`] when absent
    pub namespace: String,
    /// Repository name
    pub repository: String,
    /// Raw version string (tag)
    pub version: String,
}

impl ImageReference {
    /// Parse an image string
    ///
    /// - `app` -> repository only, sentinel namespace, version `latest`
    /// - `org/app` -> namespace + repository
    /// - `ghcr.io/app` -> registry + repository (first segment contains a `.`)
    /// - `ghcr.io/org/app:1.0` -> registry, namespace, repository, version
    pub fn parse(image: &str) -> Result<Self, ReferenceError> {
        // A colon followed by a `/` belongs to a registry port, not a tag.
        let (path, version) = match image.rsplit_once(':') {
            Some((path, version)) if !version.contains('/') => (path, version),
            _ => (image, DEFAULT_VERSION),
        };

        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ReferenceError::EmptySegment(image.to_string()));
        }

        let (registry, namespace, repository) = match segments.as_slice() {
            [repository] => (None, NAMESPACE_SENTINEL, *repository),
            [first, repository] if first.contains('.') => {
                (Some(*first), NAMESPACE_SENTINEL, *repository)
            }
            [namespace, repository] => (None, *namespace, *repository),
            [registry, namespace, repository] => (Some(*registry), *namespace, *repository),
            _ => return Err(ReferenceError::TooManySegments(image.to_string())),
        };

        Ok(Self {
            registry: registry.map(str::to_string),
            namespace: namespace.to_string(),
            repository: repository.to_string(),
            version: version.to_string(),
        })
    }

    /// Whether the reference carries a real namespace
    pub fn has_namespace(&self) -> bool {
        self.namespace != NAMESPACE_SENTINEL
    }

    /// Canonical image id: `registry/namespace/repository` with absent parts omitted
    pub fn full_image(&self) -> String {
        [
            self.registry.as_deref(),
            self.has_namespace().then_some(self.namespace.as_str()),
            Some(self.repository.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("/")
    }

    /// `namespace/repository`, the second override lookup key
    pub fn namespaced_repository(&self) -> String {
        format!("{}/{}", self.namespace, self.repository)
    }

    /// Image string for a new version: `full_image:version`
    pub fn with_version(&self, version: &str) -> String {
        format!("{}:{}", self.full_image(), version)
    }
}

impl FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.full_image(), self.version)
    }
}
