/*!
 * Storage Configuration
 *
 * Host environment and storage-root policy, injected at construction.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::errors::{StorageError, StorageResult};
use crate::core::limits::{DEFAULT_STORAGE_ROOT, MAX_ROOT_DEPTH, SUGGESTED_SYNC_TIMEOUT};
use crate::vfs::{MountOptions, PersistenceBackend};

/// Environment variable names read by `StorageConfig::from_env`
pub mod env {
    pub const STORAGE_ROOT: &str = "BEEKEEPER_STORAGE_ROOT";
    pub const HOST_ENV: &str = "BEEKEEPER_HOST_ENV";
    pub const BACKEND: &str = "BEEKEEPER_BACKEND";
    pub const SYNC_TIMEOUT_MS: &str = "BEEKEEPER_SYNC_TIMEOUT_MS";
}

/// Where the embedded runtime is hosted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEnvironment {
    /// Browser: no native working directory, persistence must be mounted
    Web,
    /// Native host: relative paths allowed, storage durable without a mount
    #[default]
    Native,
}

impl HostEnvironment {
    /// Whether storage roots must be absolute
    #[inline]
    pub fn requires_absolute_paths(&self) -> bool {
        matches!(self, HostEnvironment::Web)
    }

    /// Whether a persistence backend must be mounted explicitly
    #[inline]
    pub fn requires_explicit_mount(&self) -> bool {
        matches!(self, HostEnvironment::Web)
    }

    /// Backend conventionally used in this environment
    pub fn default_backend(&self) -> PersistenceBackend {
        match self {
            HostEnvironment::Web => PersistenceBackend::IndexedDb,
            HostEnvironment::Native => PersistenceBackend::LocalDirectory,
        }
    }
}

impl fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostEnvironment::Web => write!(f, "web"),
            HostEnvironment::Native => write!(f, "native"),
        }
    }
}

impl FromStr for HostEnvironment {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "browser" => Ok(HostEnvironment::Web),
            "native" | "node" => Ok(HostEnvironment::Native),
            other => Err(StorageError::Configuration(format!(
                "unknown host environment: {}",
                other
            ))),
        }
    }
}

/// Storage-root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory under which all managed state lives
    pub root: String,

    pub environment: HostEnvironment,

    /// Backend mounted at the root when the environment requires a mount
    pub backend: PersistenceBackend,

    /// Options handed to the backend on mount
    pub mount_options: MountOptions,

    /// Deepest root accepted, in segments
    pub max_depth: usize,

    /// Upper bound on a single sync; none by default
    #[serde(with = "optional_millis")]
    pub sync_timeout: Option<Duration>,
}

impl StorageConfig {
    /// Create configuration for a root with environment defaults
    pub fn new(root: impl Into<String>, environment: HostEnvironment) -> Self {
        Self {
            root: root.into(),
            environment,
            backend: environment.default_backend(),
            mount_options: MountOptions::new(),
            max_depth: MAX_ROOT_DEPTH,
            sync_timeout: None,
        }
    }

    /// Browser-hosted runtime
    pub fn web(root: impl Into<String>) -> Self {
        Self::new(root, HostEnvironment::Web)
    }

    /// Natively hosted runtime
    pub fn native(root: impl Into<String>) -> Self {
        Self::new(root, HostEnvironment::Native)
    }

    /// Same as `new` but with the suggested sync timeout applied
    pub fn production(root: impl Into<String>, environment: HostEnvironment) -> Self {
        Self::new(root, environment).with_sync_timeout(SUGGESTED_SYNC_TIMEOUT)
    }

    pub fn with_backend(mut self, backend: PersistenceBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_mount_options(mut self, options: MountOptions) -> Self {
        self.mount_options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - BEEKEEPER_STORAGE_ROOT: storage root (default: /beekeeper)
    /// - BEEKEEPER_HOST_ENV: `web` or `native` (default: native)
    /// - BEEKEEPER_BACKEND: persistence backend (default: per environment)
    /// - BEEKEEPER_SYNC_TIMEOUT_MS: sync timeout in milliseconds (default: none)
    pub fn from_env() -> StorageResult<Self> {
        let environment = match std::env::var(env::HOST_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => HostEnvironment::default(),
        };

        let root =
            std::env::var(env::STORAGE_ROOT).unwrap_or_else(|_| DEFAULT_STORAGE_ROOT.to_string());
        let mut config = Self::new(root, environment);

        if let Ok(value) = std::env::var(env::BACKEND) {
            config.backend = value
                .parse()
                .map_err(|e| StorageError::Configuration(format!("{}: {}", env::BACKEND, e)))?;
        }

        if let Ok(value) = std::env::var(env::SYNC_TIMEOUT_MS) {
            let millis: u64 = value.trim().parse().map_err(|_| {
                StorageError::Configuration(format!(
                    "{} must be a whole number of milliseconds, got {:?}",
                    env::SYNC_TIMEOUT_MS,
                    value
                ))
            })?;
            config.sync_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT, HostEnvironment::default())
    }
}

/// Serialize `Option<Duration>` as optional milliseconds
mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
