//! In-memory [`ObjectStore`] used by the test suites.
//!
//! Listing follows ListObjectsV2 rules: keys come back in lexicographic order,
//! and with a delimiter every key that has one past the prefix is folded into
//! a common prefix instead of being returned as an object.

use crate::{
    models::presigned::PresignedOperation,
    services::store::{ListPage, ObjectStore, ObjectSummary, StoreError, StoreResult},
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, u64>>,
    list_calls: AtomicUsize,
    presign_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<'a>(objects: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let store = Self::new();
        for (key, size) in objects {
            store.put(key, size);
        }
        store
    }

    pub fn put(&self, key: &str, size: u64) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), size);
    }

    /// Make every subsequent call fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StoreResult<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let objects = self.objects.lock().unwrap();
        let mut contents = Vec::new();
        let mut common_prefixes = BTreeSet::new();
        for (key, size) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(delim) = delimiter {
                if let Some(grouped) = compute_common_prefix(key, prefix, delim) {
                    common_prefixes.insert(grouped);
                    continue;
                }
            }
            contents.push(ObjectSummary {
                key: key.clone(),
                size: *size,
            });
        }

        Ok(ListPage {
            objects: contents,
            common_prefixes: common_prefixes.into_iter().collect(),
        })
    }

    async fn presign(&self, op: &PresignedOperation) -> StoreResult<String> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut url = format!(
            "https://bucket.memory.invalid/{}?x-verb={}&x-expires={}",
            op.key, op.verb, op.expires_in_seconds
        );
        if let Some(content_type) = &op.content_type {
            url.push_str("&x-content-type=");
            url.push_str(content_type);
        }
        Ok(url)
    }

    async fn probe(&self) -> StoreResult<()> {
        self.check_available()
    }
}

/// Group `key` under the first delimiter found past `prefix`, if any.
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(prefix)?;
    let pos = after_prefix.find(delimiter)?;
    let mut combined = String::from(prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delimiter_groups_folder_marker_into_common_prefix() {
        let store = MemoryStore::with_objects([("docs/", 0), ("docs/a.txt", 3), ("top.txt", 1)]);

        let page = store.list("", Some("/")).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["docs/".to_string()]);
        assert_eq!(
            page.objects,
            vec![ObjectSummary {
                key: "top.txt".into(),
                size: 1
            }]
        );

        let page = store.list("docs/", Some("/")).await.unwrap();
        assert!(page.common_prefixes.is_empty());
        assert_eq!(page.objects.len(), 2);
        assert_eq!(page.objects[0].key, "docs/");
    }

    #[tokio::test]
    async fn unavailable_store_fails_and_still_counts_calls() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.list("", None).await.is_err());
        assert_eq!(store.list_calls(), 1);
    }
}
