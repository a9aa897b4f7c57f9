use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::image::ImageReference;
use crate::version::registry::{Credentials, Protocol};

// =============================================================================
// Defaults
// =============================================================================

/// Folder holding the container definition files
pub const DEFAULT_CONTAINERS_FOLDER: &str = "containers";

/// Number of most recent tags considered per image
pub const DEFAULT_LIMIT: usize = 40;

/// Per-request network timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Directory holding the configuration files
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Configuration files in merge order; later files win
pub const CONFIG_FILES: [&str; 2] = ["update.yaml", "update.private.yaml"];

const KEY_CONTAINERS_FOLDER: &str = "containers_folder";
const KEY_LIMIT: &str = "limit";
const KEY_TIMEOUT: &str = "timeout";
const KEY_REGISTRIES: &str = "registries";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{0} must contain a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid override for '{image}': {source}")]
    InvalidOverride {
        image: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid version_regex for '{image}': {source}")]
    InvalidRegex { image: String, source: regex::Error },
}

/// Per-image update settings as written in YAML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawOverride {
    update: Option<bool>,
    version_regex: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl RawOverride {
    fn is_empty(&self) -> bool {
        self.update.is_none()
            && self.version_regex.is_none()
            && self.username.is_none()
            && self.password.is_none()
    }
}

/// Per-image update settings
#[derive(Debug, Clone)]
pub struct ImageOverride {
    /// Whether the image is updated at all
    pub update: bool,
    /// Pattern whose first capture group is the comparable version
    pub version_regex: Option<Regex>,
    pub credentials: Option<Credentials>,
}

impl Default for ImageOverride {
    fn default() -> Self {
        Self {
            update: true,
            version_regex: None,
            credentials: None,
        }
    }
}

impl ImageOverride {
    fn from_raw(image: &str, raw: RawOverride) -> Result<Self, ConfigError> {
        let version_regex = raw
            .version_regex
            .map(|pattern| Regex::new(&pattern))
            .transpose()
            .map_err(|source| ConfigError::InvalidRegex {
                image: image.to_string(),
                source,
            })?;

        let credentials = match (raw.username, raw.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        Ok(Self {
            update: raw.update.unwrap_or(true),
            version_regex,
            credentials,
        })
    }

    fn from_value(image: &str, value: Value) -> Result<Self, ConfigError> {
        let raw: RawOverride =
            serde_yaml::from_value(value).map_err(|source| ConfigError::InvalidOverride {
                image: image.to_string(),
                source,
            })?;
        Self::from_raw(image, raw)
    }

    /// Override keys written inline in a container document, if any
    pub fn from_document(image: &str, document: &Mapping) -> Result<Option<Self>, ConfigError> {
        let raw = RawOverride {
            update: document.get("update").and_then(Value::as_bool),
            version_regex: document
                .get("version_regex")
                .and_then(Value::as_str)
                .map(str::to_string),
            username: document
                .get("username")
                .and_then(Value::as_str)
                .map(str::to_string),
            password: document
                .get("password")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        if raw.is_empty() {
            return Ok(None);
        }
        Self::from_raw(image, raw).map(Some)
    }
}

/// Immutable configuration snapshot, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub containers_folder: PathBuf,
    pub limit: usize,
    pub timeout: Duration,
    /// Registry host to listing protocol; unlisted hosts use OCI
    pub registries: HashMap<String, Protocol>,
    /// Image id to override, see [`Config::override_for`]
    pub overrides: HashMap<String, ImageOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            containers_folder: PathBuf::from(DEFAULT_CONTAINERS_FOLDER),
            limit: DEFAULT_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            registries: HashMap::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Config {
    /// Load the configuration files from `config_dir` and apply environment overrides
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut merged = Mapping::new();
        for file in CONFIG_FILES {
            let path = config_dir.join(file);
            if let Some(mapping) = read_mapping(&path)? {
                debug!("Loaded configuration from {}", path.display());
                merged.extend(mapping);
            }
        }

        Self::from_mapping(merged, |key| std::env::var(key).ok())
    }

    /// Build a snapshot from a merged file mapping
    ///
    /// Scalar keys resolve as: environment (upper-cased key), file value, default.
    pub fn from_mapping(
        mapping: Mapping,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let lookup = |key: &str| {
            env(&key.to_uppercase())
                .filter(|v| !v.is_empty())
                .or_else(|| mapping.get(key).and_then(scalar_to_string))
        };

        if let Some(folder) = lookup(KEY_CONTAINERS_FOLDER) {
            config.containers_folder = PathBuf::from(folder);
        }
        if let Some(limit) = lookup(KEY_LIMIT) {
            config.limit = parse_value(KEY_LIMIT, &limit)?;
        }
        if let Some(timeout) = lookup(KEY_TIMEOUT) {
            config.timeout = Duration::from_secs(parse_value(KEY_TIMEOUT, &timeout)?);
        }

        for (key, value) in mapping {
            let Some(key) = key.as_str().map(str::to_string) else {
                continue;
            };

            if key == KEY_REGISTRIES {
                config.registries = parse_registries(&value)?;
            } else if value.is_mapping() {
                let image_override = ImageOverride::from_value(&key, value)?;
                config.overrides.insert(key, image_override);
            }
        }

        Ok(config)
    }

    /// Override for an image
    ///
    /// Keys are tried in order: full image id, `namespace/repository`,
    /// `repository`. The first hit wins.
    pub fn override_for(&self, reference: &ImageReference) -> Option<&ImageOverride> {
        [
            reference.full_image(),
            reference.namespaced_repository(),
            reference.repository.clone(),
        ]
        .iter()
        .find_map(|key| self.overrides.get(key))
    }
}

fn read_mapping(path: &Path) -> Result<Option<Mapping>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Null => Ok(Some(Mapping::new())),
        Value::Mapping(mapping) => Ok(Some(mapping)),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_registries(value: &Value) -> Result<HashMap<String, Protocol>, ConfigError> {
    let Some(mapping) = value.as_mapping() else {
        return Err(ConfigError::InvalidValue {
            key: KEY_REGISTRIES.to_string(),
            value: format!("{:?}", value),
        });
    };

    mapping
        .iter()
        .map(|(host, protocol)| {
            let parsed = protocol.as_str().and_then(|p| p.parse::<Protocol>().ok());
            match (host.as_str(), parsed) {
                (Some(host), Some(parsed)) => Ok((host.to_string(), parsed)),
                _ => Err(ConfigError::InvalidValue {
                    key: format!("{}.{}", KEY_REGISTRIES, scalar_to_string(host).unwrap_or_default()),
                    value: scalar_to_string(protocol).unwrap_or_default(),
                }),
            }
        })
        .collect()
}
