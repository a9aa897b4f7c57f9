//! Registry trait for listing image tags from various sources

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Host used when a reference carries no registry
pub const DEFAULT_REGISTRY_HOST: &str = "docker.io";

/// Basic credentials for a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One tag listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    /// Registry host as written in the reference, `None` for Docker Hub
    pub host: Option<String>,
    /// Repository path, e.g. `library/nginx`
    pub repository: String,
    /// Maximum number of tags to return
    pub limit: usize,
    pub credentials: Option<Credentials>,
}

/// Raw tags from one registry call, in delivery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    pub tags: Vec<String>,
}

impl TagList {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Keep only the last `limit` tags
    pub fn keep_last(mut self, limit: usize) -> Self {
        let start = self.tags.len().saturating_sub(limit);
        self.tags.drain(..start);
        self
    }

    /// Keep only the first `limit` tags
    pub fn keep_first(mut self, limit: usize) -> Self {
        self.tags.truncate(limit);
        self
    }
}

/// Listing protocol spoken by a registry implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// OCI distribution `/v2/<repo>/tags/list` with bearer challenge
    Oci,
    /// Docker Hub paginated namespace API
    DockerHub,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Oci => "oci",
            Protocol::DockerHub => "docker-hub",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oci" => Ok(Protocol::Oci),
            "docker-hub" => Ok(Protocol::DockerHub),
            other => Err(format!("unknown registry protocol '{other}'")),
        }
    }
}

/// Whether `host` designates Docker Hub
pub fn is_docker_hub(host: Option<&str>) -> bool {
    matches!(
        host,
        None | Some(DEFAULT_REGISTRY_HOST) | Some("index.docker.io") | Some("registry-1.docker.io")
    )
}

/// Trait for listing tags of an image repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagRegistry: Send + Sync {
    /// Returns the protocol this implementation speaks
    fn protocol(&self) -> Protocol;

    /// Lists tags for a repository
    ///
    /// # Returns
    /// * `Ok(TagList)` - At most `query.limit` tags, as delivered upstream
    /// * `Err(RegistryError)` - If any request or auth step fails
    async fn list_tags(&self, query: &TagQuery) -> Result<TagList, RegistryError>;
}
