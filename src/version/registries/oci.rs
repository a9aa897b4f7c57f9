//! OCI distribution registry implementation
//!
//! Lists tags via `GET /v2/<repo>/tags/list`. A `401` carrying a `Bearer`
//! challenge is answered by fetching a token from the challenge realm and
//! retrying the request once with that token.

use indexmap::IndexMap;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registries::with_basic_auth;
use crate::version::registry::{
    Credentials, Protocol, TagList, TagQuery, TagRegistry, is_docker_hub,
};

/// Host serving the OCI API for Docker Hub
const DOCKER_HUB_INDEX_HOST: &str = "index.docker.io";

/// Response from the tags list endpoint
#[derive(Debug, Deserialize)]
struct TagsResponse {
    tags: Option<Vec<String>>,
}

/// Response from a token realm
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
    }
}

/// Registry implementation for the OCI distribution API
pub struct OciRegistry {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl OciRegistry {
    /// Creates an OciRegistry that talks to `https://<host>`
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Creates an OciRegistry that sends every request to `base_url`
    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: Some(base_url.trim_end_matches('/').to_string()),
        }
    }

    fn base_url(&self, host: Option<&str>) -> String {
        if let Some(base_url) = &self.base_url {
            return base_url.clone();
        }

        let host = match host {
            Some(host) if !is_docker_hub(Some(host)) => host,
            _ => DOCKER_HUB_INDEX_HOST,
        };
        format!("https://{}", host)
    }

    async fn parse_tags(
        response: reqwest::Response,
        limit: usize,
    ) -> Result<TagList, RegistryError> {
        let body: TagsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse tags list response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(TagList::new(body.tags.unwrap_or_default()).keep_last(limit))
    }

    /// Fetch a bearer token from the challenge realm
    async fn fetch_token(
        &self,
        realm: &str,
        params: &IndexMap<String, String>,
        credentials: Option<&Credentials>,
    ) -> Result<String, RegistryError> {
        debug!("Requesting token from {}", realm);

        let url = token_url(realm, params)?;

        let response = with_basic_auth(self.client.get(url), credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status,
                url: realm.to_string(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        body.into_token()
            .ok_or_else(|| RegistryError::MissingToken(realm.to_string()))
    }
}

/// Realm URL with the remaining challenge parameters as query
///
/// A realm-only challenge yields the realm unchanged, without a trailing `?`.
fn token_url(realm: &str, params: &IndexMap<String, String>) -> Result<Url, RegistryError> {
    let mut url = Url::parse(realm)
        .map_err(|e| RegistryError::InvalidResponse(format!("invalid realm '{}': {}", realm, e)))?;

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    Ok(url)
}

/// Parse a `WWW-Authenticate: Bearer k="v",...` header into its parameters
///
/// Returns `None` for non-bearer schemes. Quoted values are unquoted and may
/// contain commas.
pub fn parse_bearer_challenge(header: &str) -> Option<IndexMap<String, String>> {
    let header = header.trim();
    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut params = IndexMap::new();
    let mut chars = rest.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ',' || c.is_whitespace()).is_some() {}

        let key: String = std::iter::from_fn(|| chars.next_if(|c| *c != '=' && *c != ','))
            .collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            break;
        }

        if chars.next_if_eq(&'=').is_none() {
            continue;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let value: String = if chars.next_if_eq(&'"').is_some() {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => value.extend(chars.next()),
                    c => value.push(c),
                }
            }
            value
        } else {
            std::iter::from_fn(|| chars.next_if(|c| *c != ','))
                .collect::<String>()
                .trim()
                .to_string()
        };

        params.insert(key, value);
    }

    Some(params)
}

#[async_trait::async_trait]
impl TagRegistry for OciRegistry {
    fn protocol(&self) -> Protocol {
        Protocol::Oci
    }

    async fn list_tags(&self, query: &TagQuery) -> Result<TagList, RegistryError> {
        let url = format!(
            "{}/v2/{}/tags/list",
            self.base_url(query.host.as_deref()),
            query.repository
        );
        let credentials = query.credentials.as_ref();

        let response = with_basic_auth(self.client.get(&url), credentials)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            return Self::parse_tags(response, query.limit).await;
        }

        if status != StatusCode::UNAUTHORIZED {
            warn!("Registry returned status {}: {}", status, url);
            return Err(RegistryError::Status { status, url });
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer_challenge);

        let Some(mut params) = challenge else {
            return Err(RegistryError::Status { status, url });
        };

        let Some(realm) = params.shift_remove("realm") else {
            debug!("Bearer challenge without realm for {}", url);
            return Ok(TagList::default());
        };

        let token = self.fetch_token(&realm, &params, credentials).await?;

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Registry returned status {} after authentication: {}", status, url);
            return Err(RegistryError::Status { status, url });
        }

        Self::parse_tags(response, query.limit).await
    }
}
