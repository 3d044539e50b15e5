//! src/services/navigator.rs
//!
//! Client-side folder tree over the listing resolver and presign issuer.
//!
//! Each folder key owns a small state machine:
//!
//! ```text
//! Collapsed --expand--> Loading --ok--> Loaded --collapse--> Collapsed
//!                          \--err--> Failed --expand--> Loading
//! ```
//!
//! Children are cached per folder for the lifetime of the navigator, so
//! expanding a collapsed folder a second time is served from memory. Only one
//! listing per folder may be in flight; a second expand while `Loading` is a
//! no-op. Downloads and uploads carry their own busy flags, keyed by file key
//! and folder key respectively.

use crate::{
    models::{
        entry::Entry,
        presigned::{DownloadGrant, UploadGrant},
    },
    services::{
        issuer::{IssueError, PresignIssuer},
        listing::{ListingError, ListingResolver, normalize_prefix},
    },
};
use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

/// Key of the root folder.
pub const ROOT: &str = "";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Collapsed,
    Loading,
    Loaded,
    /// Last listing failed; the message is suitable for a "try again" prompt.
    Failed(String),
}

/// What an expand request ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Children were fetched from the store.
    Fetched,
    /// Children were already cached; no store call was made.
    Cached,
    /// A listing for this folder is already in flight.
    AlreadyLoading,
    /// The folder is already expanded.
    AlreadyOpen,
}

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

pub type NavigatorResult<T> = Result<T, NavigatorError>;

#[derive(Debug, Default)]
struct FolderNode {
    state: NodeState,
    children: Option<Arc<Vec<Entry>>>,
}

/// One line of the visible tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    /// Nesting level; direct children of the root are at depth 0.
    pub depth: usize,
    pub entry: Entry,
    /// Expansion state for folders, `None` for files.
    pub state: Option<NodeState>,
    /// Download in flight (files) or upload in flight (folders).
    pub busy: bool,
}

pub struct TreeNavigator {
    resolver: ListingResolver,
    issuer: PresignIssuer,
    nodes: DashMap<String, FolderNode>,
    downloads: DashSet<String>,
    uploads: DashSet<String>,
}

impl TreeNavigator {
    pub fn new(resolver: ListingResolver, issuer: PresignIssuer) -> Self {
        Self {
            resolver,
            issuer,
            nodes: DashMap::new(),
            downloads: DashSet::new(),
            uploads: DashSet::new(),
        }
    }

    /// Create a navigator and eagerly load the root listing.
    pub async fn start(resolver: ListingResolver, issuer: PresignIssuer) -> NavigatorResult<Self> {
        let navigator = Self::new(resolver, issuer);
        navigator.expand(ROOT).await?;
        Ok(navigator)
    }

    /// Expand `folder`, fetching its children unless they are cached.
    ///
    /// On failure the folder is left in [`NodeState::Failed`] and expanding it
    /// again retries the listing.
    pub async fn expand(&self, folder: &str) -> NavigatorResult<ExpandOutcome> {
        let key = normalize_prefix(folder);
        {
            let mut entry = self.nodes.entry(key.clone()).or_default();
            let node = &mut *entry;
            match node.state {
                NodeState::Loading => return Ok(ExpandOutcome::AlreadyLoading),
                NodeState::Loaded => return Ok(ExpandOutcome::AlreadyOpen),
                NodeState::Collapsed if node.children.is_some() => {
                    node.state = NodeState::Loaded;
                    return Ok(ExpandOutcome::Cached);
                }
                NodeState::Collapsed | NodeState::Failed(_) => node.state = NodeState::Loading,
            }
        }

        self.load(&key).await?;
        Ok(ExpandOutcome::Fetched)
    }

    /// Collapse `folder`, keeping its cached children. The root stays open.
    pub fn collapse(&self, folder: &str) {
        let key = normalize_prefix(folder);
        if key == ROOT {
            return;
        }
        if let Some(mut node) = self.nodes.get_mut(&key) {
            if matches!(node.state, NodeState::Loaded | NodeState::Failed(_)) {
                node.state = NodeState::Collapsed;
            }
        }
    }

    /// Drop the cached children of `folder` and list it again.
    ///
    /// Used after an upload lands in the folder or when the user asks for a
    /// fresh view.
    pub async fn refresh(&self, folder: &str) -> NavigatorResult<ExpandOutcome> {
        let key = normalize_prefix(folder);
        {
            let mut entry = self.nodes.entry(key.clone()).or_default();
            if entry.state == NodeState::Loading {
                return Ok(ExpandOutcome::AlreadyLoading);
            }
            entry.children = None;
            entry.state = NodeState::Loading;
        }

        self.load(&key).await?;
        Ok(ExpandOutcome::Fetched)
    }

    /// Resolve `key`, whose node must already be marked `Loading`.
    async fn load(&self, key: &str) -> NavigatorResult<()> {
        let mut guard = LoadingGuard {
            nodes: &self.nodes,
            key,
            armed: true,
        };
        let result = self.resolver.resolve(key).await;
        guard.armed = false;

        let mut node = self.nodes.entry(key.to_string()).or_default();
        match result {
            Ok(children) => {
                debug!(folder = key, children = children.len(), "folder loaded");
                node.children = Some(Arc::new(children));
                node.state = NodeState::Loaded;
                Ok(())
            }
            Err(err) => {
                warn!(folder = key, error = %err, "folder listing failed");
                node.state = NodeState::Failed(err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn state(&self, folder: &str) -> NodeState {
        self.nodes
            .get(&normalize_prefix(folder))
            .map(|node| node.state.clone())
            .unwrap_or_default()
    }

    /// Cached children of `folder`, whether or not it is currently expanded.
    pub fn children(&self, folder: &str) -> Option<Arc<Vec<Entry>>> {
        self.nodes
            .get(&normalize_prefix(folder))
            .and_then(|node| node.children.clone())
    }

    /// Request a download URL for `file`.
    ///
    /// Returns `Ok(None)` when a download of the same file is already in
    /// flight. The busy flag is cleared on success, failure, or if the
    /// returned future is dropped.
    pub async fn download(&self, file: &str) -> NavigatorResult<Option<DownloadGrant>> {
        let Some(_busy) = BusyGuard::acquire(&self.downloads, file) else {
            debug!(file, "download already in flight");
            return Ok(None);
        };
        let grant = self.issuer.issue_download(file).await?;
        Ok(Some(grant))
    }

    pub fn is_downloading(&self, file: &str) -> bool {
        self.downloads.contains(file)
    }

    /// Request an upload URL for `file_name` inside `folder`.
    ///
    /// Returns `Ok(None)` when an upload into the same folder is already in
    /// flight. Once the client has sent the bytes it should
    /// [`refresh`](Self::refresh) the folder.
    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: Option<&str>,
    ) -> NavigatorResult<Option<UploadGrant>> {
        let folder = normalize_prefix(folder);
        if file_name.is_empty() {
            return Err(IssueError::MissingKey.into());
        }
        let Some(_busy) = BusyGuard::acquire(&self.uploads, &folder) else {
            debug!(folder = %folder, "upload already in flight");
            return Ok(None);
        };
        let key = format!("{folder}{file_name}");
        let grant = self.issuer.issue_upload(&key, content_type).await?;
        Ok(Some(grant))
    }

    pub fn is_uploading(&self, folder: &str) -> bool {
        self.uploads.contains(&normalize_prefix(folder))
    }

    /// Flatten the expanded part of the tree, folders before files at each
    /// level.
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.push_rows(ROOT, 0, &mut rows);
        rows
    }

    fn push_rows(&self, folder: &str, depth: usize, rows: &mut Vec<TreeRow>) {
        let children = match self.nodes.get(folder) {
            Some(node) if node.state == NodeState::Loaded => node.children.clone(),
            _ => None,
        };
        let Some(children) = children else {
            return;
        };

        let (folders, files): (Vec<&Entry>, Vec<&Entry>) =
            children.iter().partition(|entry| entry.is_folder());

        for entry in folders {
            rows.push(TreeRow {
                depth,
                entry: entry.clone(),
                state: Some(self.state(&entry.key)),
                busy: self.is_uploading(&entry.key),
            });
            self.push_rows(&entry.key, depth + 1, rows);
        }
        for entry in files {
            rows.push(TreeRow {
                depth,
                entry: entry.clone(),
                state: None,
                busy: self.is_downloading(&entry.key),
            });
        }
    }

    /// Expand every folder down to `depth` levels below the root, listing
    /// sibling folders concurrently. Returns the folders that failed.
    pub async fn expand_to_depth(&self, depth: usize) -> Vec<(String, NavigatorError)> {
        let mut failures = Vec::new();
        for level in 0..depth {
            let pending = self
                .rows()
                .into_iter()
                .filter(|row| row.depth == level && row.entry.is_folder())
                .filter(|row| row.state != Some(NodeState::Loaded))
                .map(|row| row.entry.key)
                .collect::<Vec<_>>();
            if pending.is_empty() {
                break;
            }

            let results = join_all(pending.iter().map(|key| self.expand(key))).await;
            for (key, result) in pending.into_iter().zip(results) {
                if let Err(err) = result {
                    failures.push((key, err));
                }
            }
        }
        failures
    }

    /// Forget cached children of folders hidden behind a collapsed ancestor.
    ///
    /// Returns how many folder nodes were dropped.
    pub fn prune_hidden(&self) -> usize {
        let visible = self
            .rows()
            .into_iter()
            .filter(|row| row.entry.is_folder())
            .map(|row| row.entry.key)
            .chain(std::iter::once(ROOT.to_string()))
            .collect::<HashSet<_>>();

        let before = self.nodes.len();
        self.nodes
            .retain(|key, node| node.state == NodeState::Loading || visible.contains(key));
        before - self.nodes.len()
    }
}

/// Resets a folder left in `Loading` when its listing future is dropped.
struct LoadingGuard<'a> {
    nodes: &'a DashMap<String, FolderNode>,
    key: &'a str,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(mut node) = self.nodes.get_mut(self.key) {
            if node.state == NodeState::Loading {
                node.state = NodeState::Collapsed;
            }
        }
    }
}

/// Holds a busy flag in `set` for as long as it lives.
struct BusyGuard<'a> {
    set: &'a DashSet<String>,
    key: String,
}

impl<'a> BusyGuard<'a> {
    fn acquire(set: &'a DashSet<String>, key: &str) -> Option<Self> {
        set.insert(key.to_string()).then(|| Self {
            set,
            key: key.to_string(),
        })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}
