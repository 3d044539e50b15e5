//! src/services/listing.rs
//!
//! Turns the flat key space of the bucket into the children of one folder.
//!
//! There is a single entry point, [`ListingResolver::resolve`], and it treats
//! the root and every nested folder the same way: list with `/` as the
//! delimiter, then re-check every returned key against the queried prefix so
//! that only direct children survive. The folder's own marker object (a key
//! equal to the prefix) never appears in the result.

use crate::{
    models::entry::{DELIMITER, Entry},
    services::store::{ObjectStore, StoreError},
};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    UpstreamUnavailable(#[from] StoreError),
}

pub type ListingResult<T> = Result<T, ListingError>;

/// Resolves the direct children of a folder prefix.
#[derive(Clone)]
pub struct ListingResolver {
    store: Arc<dyn ObjectStore>,
}

impl ListingResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// List the folders and files directly inside `prefix`.
    ///
    /// `""` is the root. A non-empty prefix without a trailing `/` is treated
    /// as the folder of that name. Folders are returned before files, each in
    /// store order. An unknown prefix yields an empty listing.
    pub async fn resolve(&self, prefix: &str) -> ListingResult<Vec<Entry>> {
        let prefix = normalize_prefix(prefix);
        let page = self.store.list(&prefix, Some(DELIMITER)).await?;

        let mut seen = HashSet::new();
        let mut folders = Vec::with_capacity(page.common_prefixes.len());
        for common in page.common_prefixes {
            if !is_direct_child_folder(&prefix, &common) {
                warn!(prefix = %prefix, key = %common, "dropping out-of-scope common prefix");
                continue;
            }
            if seen.insert(common.clone()) {
                folders.push(Entry::folder(common));
            }
        }

        let mut files = Vec::with_capacity(page.objects.len());
        for object in page.objects {
            if !is_direct_child_file(&prefix, &object.key) {
                continue;
            }
            if seen.insert(object.key.clone()) {
                files.push(Entry::file(object.key, object.size));
            }
        }

        debug!(
            prefix = %prefix,
            folders = folders.len(),
            files = files.len(),
            "resolved listing"
        );

        folders.extend(files);
        Ok(folders)
    }

    /// List every file directly inside `prefix` without grouping.
    ///
    /// Fetches the whole subtree in one call and keeps only keys one segment
    /// deep, so it never yields folders. Use [`resolve`](Self::resolve) when
    /// the folder structure matters.
    pub async fn scan_files(&self, prefix: &str) -> ListingResult<Vec<Entry>> {
        let prefix = normalize_prefix(prefix);
        let page = self.store.list(&prefix, None).await?;

        Ok(page
            .objects
            .into_iter()
            .filter(|object| is_direct_child_file(&prefix, &object.key))
            .map(|object| Entry::file(object.key, object.size))
            .collect())
    }
}

/// Bring a caller supplied prefix into folder-key form.
///
/// Empty stays empty (root); anything else gains a trailing `/` if missing.
/// A leading `/` is kept: `"/"` is the folder S3 groups keys like `/x.txt`
/// under, and it must be listable like any other.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(DELIMITER) {
        prefix.to_string()
    } else {
        format!("{prefix}{DELIMITER}")
    }
}

/// `key` is a file one level below `prefix`: a non-empty remainder without `/`.
fn is_direct_child_file(prefix: &str, key: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && !rest.contains(DELIMITER),
        None => false,
    }
}

/// `key` is a folder one level below `prefix`: the remainder holds exactly
/// one `/`, at the end.
fn is_direct_child_folder(prefix: &str, key: &str) -> bool {
    match key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(DELIMITER))
    {
        Some(segment) => !segment.contains(DELIMITER),
        None => false,
    }
}
