use std::env;
use thiserror::Error;

pub const ENV_SERVER: &str = "CENTRAL_STORAGE_SERVER";
pub const ENV_FRONT: &str = "CENTRAL_STORAGE_FRONT";
pub const ENV_KEY: &str = "CENTRAL_STORAGE_KEY";
pub const ENV_SECRET: &str = "CENTRAL_STORAGE_SECRET";
pub const ENV_VERSION: &str = "CENTRAL_STORAGE_VERSION";

const DEFAULT_VERSION: &str = "1";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

/// Connection settings for [`crate::CentralStorageClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base url of the storage server, used for api calls.
    pub server: String,
    /// Optional url handed out to end users when linking to assets.
    ///
    /// Defaults to `server`.
    pub front: Option<String>,
    /// Consumer key sent with every signed request.
    pub key: String,
    /// Shared secret used for signing. Never sent.
    pub secret: String,
    /// Added to asset urls as `_v` when set.
    ///
    /// Defaults to `1`.
    pub version: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8000".to_string(),
            front: None,
            key: String::new(),
            secret: String::new(),
            version: Some(DEFAULT_VERSION.to_string()),
        }
    }
}

impl ClientConfig {
    pub fn new(
        server: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            key: key.into(),
            secret: secret.into(),
            ..Default::default()
        }
    }

    pub fn with_front(mut self, front: impl Into<String>) -> Self {
        self.front = Some(front.into());
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Reads the `CENTRAL_STORAGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            server: require(ENV_SERVER)?,
            front: get(ENV_FRONT),
            key: require(ENV_KEY)?,
            secret: require(ENV_SECRET)?,
            version: Some(get(ENV_VERSION).unwrap_or_else(|| DEFAULT_VERSION.to_string())),
        })
    }
}
