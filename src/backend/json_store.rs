use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::backend::interface::{BackendError, KeyValueStore, Result, check_quota};

/// Key-value store persisted as a single JSON object on disk.
/// The whole file is rewritten on every change: the new content goes to a
/// temporary file next to it, which then replaces the old file in one rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
    quota: Option<usize>
}

impl JsonFileStore {
    /// Opens the store at `path`. A file that does not exist yet is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<JsonFileStore> {
        let path = path.as_ref().to_path_buf();
        let items: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|source| BackendError::Format { path: path.clone(), source })?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(BackendError::Io { path, source })
        };
        debug!("opened store {} with {} keys", path.display(), items.len());
        return Ok(JsonFileStore { path, items, quota: None });
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> JsonFileStore {
        self.quota = quota;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.items)
            .map_err(|source| BackendError::Format { path: self.path.clone(), source })?;
        let io_error = |source| BackendError::Io { path: self.path.clone(), source };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new(".")
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(content.as_bytes()).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        file.persist(&self.path).map_err(|err| io_error(err.error))?;
        return Ok(());
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(&self.items, self.quota, key, value)?;
        let previous = self.items.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.flush() {
            match previous {
                Some(old) => self.items.insert(key.to_owned(), old),
                None => self.items.remove(key)
            };
            return Err(err);
        }
        return Ok(());
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        return Ok(());
    }
}


#[cfg(test)]
mod tests {
    use crate::backend::{BackendError, JsonFileStore, KeyValueStore};

    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn missing_file_is_empty(dir: TempDir) {
        let store = JsonFileStore::open(dir.path().join("ledger.json")).unwrap();
        assert_eq!(store.get_item("balance").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[rstest]
    fn writes_survive_reopen(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_item("balance", "9900").unwrap();
        store.set_item("transactionHistory", "[]").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("balance").unwrap().as_deref(), Some("9900"));
        assert_eq!(reopened.get_item("transactionHistory").unwrap().as_deref(), Some("[]"));
    }

    #[rstest]
    fn file_is_json_object_of_strings(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_item("balance", "42.5").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, json!({"balance": "42.5"}));
    }

    #[rstest]
    fn remove_item_rewrites_file(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_item("balance", "1").unwrap();
        store.remove_item("balance").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("balance").unwrap(), None);
    }

    #[rstest]
    fn rejects_non_object_file(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let res = JsonFileStore::open(&path);
        assert!(matches!(res, Err(BackendError::Format { .. })));
    }

    #[rstest]
    fn writes_leave_no_stray_files(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_item("balance", "9900").unwrap();
        store.set_item("balance", "9800").unwrap();
        store.remove_item("balance").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, ["ledger.json"]);
    }

    #[rstest]
    fn failed_write_keeps_previous_value(dir: TempDir) {
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let mut store = JsonFileStore::open(sub.join("ledger.json")).unwrap();
        store.set_item("balance", "9900").unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        let res = store.set_item("balance", "9800");
        assert!(matches!(res, Err(BackendError::Io { .. })));
        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("9900"));
    }

    #[rstest]
    fn quota_leaves_file_untouched(dir: TempDir) {
        let path = dir.path().join("ledger.json");
        let mut store = JsonFileStore::open(&path).unwrap().with_quota(Some(10));
        let res = store.set_item("balance", "10000");
        assert!(matches!(res, Err(BackendError::QuotaExceeded { .. })));
        assert!(!path.exists());
    }
}
