/*!
 * Persistence Backend Descriptors
 * Which durable layer a mount binds to and with what options
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::errors::VfsError;

/// Durable storage layer that can back a mounted subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// Browser-local indexed storage
    IndexedDb,
    /// Directory on the host filesystem
    LocalDirectory,
    /// Process-local store, mostly for tests
    Memory,
}

impl PersistenceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceBackend::IndexedDb => "indexed_db",
            PersistenceBackend::LocalDirectory => "local_directory",
            PersistenceBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for PersistenceBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistenceBackend {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indexed_db" | "indexeddb" | "idbfs" => Ok(PersistenceBackend::IndexedDb),
            "local_directory" | "local" | "nodefs" => Ok(PersistenceBackend::LocalDirectory),
            "memory" | "mem" => Ok(PersistenceBackend::Memory),
            other => Err(VfsError::NotSupported(format!(
                "unknown persistence backend: {}",
                other
            ))),
        }
    }
}

/// Options passed through to a backend when mounting
///
/// Empty unless configured; backends decide what keys mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountOptions(BTreeMap<String, serde_json::Value>);

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
