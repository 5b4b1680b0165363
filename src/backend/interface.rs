use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to access store file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("store file {} is not a JSON object of strings", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error
    },
    /// Writing `key` would push the store past its size limit.
    #[error("writing '{key}' needs {needed} bytes, store quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize
    },
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// A string-keyed store of string values, the same contract as a
/// browser's local storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Bytes a map occupies once `key` is set to `value`.
pub(crate) fn size_after_set(items: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    let current: usize = items.iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
    return current + key.len() + value.len();
}

pub(crate) fn check_quota(items: &BTreeMap<String, String>, quota: Option<usize>, key: &str, value: &str) -> Result<()> {
    if let Some(quota) = quota {
        let needed = size_after_set(items, key, value);
        if needed > quota {
            return Err(BackendError::QuotaExceeded { key: key.to_owned(), needed, quota });
        }
    }
    return Ok(());
}
