//! Per-container update resolution
//!
//! Decides whether a container image has a strictly newer release among the
//! tags its registry reports.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::{Config, ImageOverride};
use crate::image::ImageReference;
use crate::version::error::SkipReason;
use crate::version::registries::RegistrySet;
use crate::version::registry::{TagQuery, is_docker_hub};
use crate::version::semver::{ParsedVersion, comparable_version};

/// Namespace Docker Hub uses for official images
const DOCKER_HUB_OFFICIAL_NAMESPACE: &str = "library";

/// A newer version to write back for one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    /// Canonical image id, e.g. `ghcr.io/org/app`
    pub full_image: String,
    /// Repository name, used in commit messages
    pub repository: String,
    /// Raw tag of the selected version
    pub tag: String,
}

impl UpdateDecision {
    /// New value for the `image` field
    pub fn image(&self) -> String {
        format!("{}:{}", self.full_image, self.tag)
    }
}

/// Resolves update decisions against the configured registries
pub struct UpdateResolver {
    config: Arc<Config>,
    registries: Arc<RegistrySet>,
}

impl UpdateResolver {
    pub fn new(config: Arc<Config>, registries: Arc<RegistrySet>) -> Self {
        Self { config, registries }
    }

    /// Resolve the update for one container image
    ///
    /// `inline` holds override keys written in the container document; they
    /// apply only when no configured override matches the image.
    pub async fn resolve(
        &self,
        image: &str,
        inline: Option<&ImageOverride>,
    ) -> Result<UpdateDecision, SkipReason> {
        let reference = ImageReference::parse(image)?;

        let default_override = ImageOverride::default();
        let settings = self
            .config
            .override_for(&reference)
            .or(inline)
            .unwrap_or(&default_override);

        if !settings.update {
            return Err(SkipReason::UpdateDisabled);
        }

        let pattern = settings.version_regex.as_ref();
        let current = comparable_version(&reference.version, pattern)
            .ok_or_else(|| SkipReason::UnparsableVersion(reference.version.clone()))?;

        let query = TagQuery {
            host: reference.registry.clone(),
            repository: upstream_repository(&reference),
            limit: self.config.limit,
            credentials: settings.credentials.clone(),
        };

        let registry = self.registries.for_host(reference.registry.as_deref());
        debug!(
            "Listing tags for {} via {}",
            query.repository,
            registry.protocol().as_str()
        );
        let tags = registry.list_tags(&query).await?;

        if tags.is_empty() {
            return Err(SkipReason::NoTags);
        }

        let newest = select_newest(&current, &tags.tags, pattern)
            .ok_or_else(|| SkipReason::NoNewerVersion(reference.version.clone()))?;

        Ok(UpdateDecision {
            full_image: reference.full_image(),
            repository: reference.repository.clone(),
            tag: newest.to_string(),
        })
    }
}

/// Repository path as the registry knows it
///
/// Docker Hub keeps official images under `library/`; other registries get
/// the bare repository when the reference has no namespace.
pub fn upstream_repository(reference: &ImageReference) -> String {
    if reference.has_namespace() {
        reference.namespaced_repository()
    } else if is_docker_hub(reference.registry.as_deref()) {
        format!("{}/{}", DOCKER_HUB_OFFICIAL_NAMESPACE, reference.repository)
    } else {
        reference.repository.clone()
    }
}

/// Pick the highest tag strictly greater than `current`
///
/// Tags without a comparable version are skipped. Among equal versions the
/// first tag in delivery order wins.
pub fn select_newest<'a>(
    current: &ParsedVersion,
    tags: &'a [String],
    pattern: Option<&Regex>,
) -> Option<&'a str> {
    tags.iter()
        .filter_map(|tag| match comparable_version(tag, pattern) {
            Some(version) => Some((version, tag.as_str())),
            None => {
                debug!("Skipping tag '{}': not a comparable version", tag);
                None
            }
        })
        .filter(|(version, _)| version > current)
        .fold(None, |best: Option<(ParsedVersion, &str)>, candidate| match best {
            Some(b) if b.0 >= candidate.0 => Some(b),
            _ => Some(candidate),
        })
        .map(|(_, tag)| tag)
}
