use std::{fs, path::{Path, PathBuf}};

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};
use toml;

use crate::backend::{self, JsonFileStore};

pub const DEFAULT_STORE_PATH: &str = "ledger.json";

/// What to do when a stored value cannot be parsed back into ledger state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorruptDataPolicy {
    /// Abort loading and surface the error.
    #[default]
    Fail,
    /// Log it and fall back to the default for that key.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Maximum bytes of keys plus values the store accepts.
    pub quota_bytes: Option<usize>,
    pub on_corrupt: CorruptDataPolicy
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from(DEFAULT_STORE_PATH),
            quota_bytes: None,
            on_corrupt: CorruptDataPolicy::default()
        }
    }
}

impl StoreConfig {
    pub fn open(&self) -> backend::Result<JsonFileStore> {
        Ok(JsonFileStore::open(&self.path)?.with_quota(self.quota_bytes))
    }
}

/// Configuration file shared by the binaries; every section is optional.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig
}

impl AppConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(filepath)
            .with_context(|| "failed to read config file")?;
        let config = toml::from_str(&file_content)
            .with_context(|| "failed to parse config file")?;
        return Ok(config);
    }

    /// Reads `filepath` if given, otherwise uses defaults.
    pub fn read_or_default(filepath: Option<&Path>) -> anyhow::Result<Self> {
        match filepath {
            Some(path) => AppConfig::read(path),
            None => Ok(AppConfig::default())
        }
    }
}
