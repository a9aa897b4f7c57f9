//! Registry implementations for listing image tags
//!
//! [`RegistrySet`] maps registry hosts to implementations. Hosts without an
//! entry use the default implementation (OCI distribution).

pub mod docker_hub;
pub mod oci;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use docker_hub::DockerHubRegistry;
pub use oci::OciRegistry;

use crate::version::registry::{Credentials, DEFAULT_REGISTRY_HOST, Protocol, TagRegistry};

/// User agent sent with every registry request
const USER_AGENT: &str = concat!("image-updater/", env!("CARGO_PKG_VERSION"));

/// Creates the HTTP client shared by all registry implementations
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Attach basic credentials to `request` when present
pub(crate) fn with_basic_auth(
    request: reqwest::RequestBuilder,
    credentials: Option<&Credentials>,
) -> reqwest::RequestBuilder {
    match credentials {
        Some(c) => request.basic_auth(&c.username, Some(&c.password)),
        None => request,
    }
}

/// Host to implementation dispatch table
pub struct RegistrySet {
    default: Arc<dyn TagRegistry>,
    by_host: HashMap<String, Arc<dyn TagRegistry>>,
}

impl RegistrySet {
    /// Creates a set where every host uses `default`
    pub fn new(default: Arc<dyn TagRegistry>) -> Self {
        Self {
            default,
            by_host: HashMap::new(),
        }
    }

    /// Creates the production set from a host to protocol table
    pub fn from_protocols(
        client: reqwest::Client,
        protocols: &HashMap<String, Protocol>,
    ) -> Self {
        let oci: Arc<dyn TagRegistry> = Arc::new(OciRegistry::new(client.clone()));
        let docker_hub: Arc<dyn TagRegistry> =
            Arc::new(DockerHubRegistry::with_default_url(client));

        let mut set = Self::new(oci.clone());
        for (host, protocol) in protocols {
            let registry = match protocol {
                Protocol::Oci => oci.clone(),
                Protocol::DockerHub => docker_hub.clone(),
            };
            set.register(host, registry);
        }
        set
    }

    /// Routes `host` to `registry`
    pub fn register(&mut self, host: &str, registry: Arc<dyn TagRegistry>) {
        self.by_host.insert(host.to_string(), registry);
    }

    /// Implementation for `host`; an absent host is looked up as `docker.io`
    pub fn for_host(&self, host: Option<&str>) -> &dyn TagRegistry {
        let host = host.unwrap_or(DEFAULT_REGISTRY_HOST);
        let registry = self.by_host.get(host).unwrap_or(&self.default);
        &**registry
    }
}
