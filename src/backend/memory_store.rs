use std::collections::BTreeMap;

use crate::backend::interface::{KeyValueStore, Result, check_quota};

/// Store kept entirely in memory. Used by tests and by anything that
/// does not need to outlive the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    quota: Option<usize>
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// A store that refuses writes once keys and values exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> MemoryStore {
        MemoryStore { items: BTreeMap::new(), quota: Some(quota) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let items = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        MemoryStore { items, quota: None }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(&self.items, self.quota, key, value)?;
        self.items.insert(key.to_owned(), value.to_owned());
        return Ok(());
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        return Ok(());
    }
}


#[cfg(test)]
mod tests {
    use crate::backend::{BackendError, KeyValueStore, MemoryStore};

    #[test]
    fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("balance").unwrap(), None);
    }

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        store.set_item("balance", "9500.5").unwrap();
        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("9500.5"));

        store.set_item("balance", "9000").unwrap();
        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("9000"));
        assert_eq!(store.len(), 1);

        store.remove_item("balance").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let mut store = MemoryStore::with_quota(16);
        store.set_item("balance", "10000").unwrap();

        let res = store.set_item("transactionHistory", "[]");
        assert!(matches!(res, Err(BackendError::QuotaExceeded { needed: 32, quota: 16, .. })));
        assert_eq!(store.get_item("transactionHistory").unwrap(), None);
    }

    #[test]
    fn quota_counts_replaced_value_once() {
        let mut store = MemoryStore::with_quota(12);
        store.set_item("balance", "10000").unwrap();
        store.set_item("balance", "9900").unwrap();
        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("9900"));
    }

    #[test]
    fn works_through_mutable_reference() {
        fn write(mut store: impl KeyValueStore) {
            store.set_item("k", "v").unwrap();
        }
        let mut store = MemoryStore::new();
        write(&mut store);
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
