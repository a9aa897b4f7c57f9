//! Docker Hub namespace API implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registries::with_basic_auth;
use crate::version::registry::{Protocol, TagList, TagQuery, TagRegistry};

/// Default base URL for the Docker Hub API
const DEFAULT_BASE_URL: &str = "https://hub.docker.com";

/// Response from the Docker Hub tags API
#[derive(Debug, Deserialize)]
struct TagsPage {
    #[serde(default)]
    results: Vec<HubTag>,
}

#[derive(Debug, Deserialize)]
struct HubTag {
    name: String,
}

/// Registry implementation for the Docker Hub tags API
///
/// Only the first page is requested; Docker Hub delivers it newest first.
pub struct DockerHubRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl DockerHubRegistry {
    /// Creates a new DockerHubRegistry with a custom base URL
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_default_url(client: reqwest::Client) -> Self {
        Self::new(client, DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl TagRegistry for DockerHubRegistry {
    fn protocol(&self) -> Protocol {
        Protocol::DockerHub
    }

    async fn list_tags(&self, query: &TagQuery) -> Result<TagList, RegistryError> {
        let Some((namespace, repository)) = query.repository.split_once('/') else {
            return Err(RegistryError::InvalidResponse(format!(
                "repository '{}' has no namespace",
                query.repository
            )));
        };

        let url = format!(
            "{}/v2/namespaces/{}/repositories/{}/tags?page_size={}",
            self.base_url, namespace, repository, query.limit
        );

        let credentials = query.credentials.as_ref();
        if let Some(c) = credentials {
            debug!("Listing {} as {}", query.repository, c.username);
        }

        let response = with_basic_auth(self.client.get(&url), credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Docker Hub returned status {}: {}", status, url);
            return Err(RegistryError::Status { status, url });
        }

        let page: TagsPage = response.json().await.map_err(|e| {
            warn!("Failed to parse Docker Hub tags response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let tags = page.results.into_iter().map(|t| t.name).collect();

        Ok(TagList::new(tags).keep_first(query.limit))
    }
}
