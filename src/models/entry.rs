//! Represents one classified child of a folder: either a folder or a file.

use serde::Serialize;

/// Separator used by convention to express folders inside flat object keys.
pub const DELIMITER: &str = "/";

/// Whether an entry stands for a common prefix or a stored object.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// A resolved, classified view of either an object or a common prefix.
///
/// A `Folder` key always ends in `/`; a `File` key never does.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Full object key (or common prefix) within the bucket.
    pub key: String,

    pub kind: EntryKind,

    /// Size in bytes. Present only for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Entry {
    pub fn folder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: EntryKind::Folder,
            size: None,
        }
    }

    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            kind: EntryKind::File,
            size: Some(size),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Last path segment of the key, without the folder's trailing slash.
    pub fn display_name(&self) -> &str {
        display_name(&self.key)
    }
}

/// Return the last path segment of `key`, ignoring one trailing `/`.
///
/// `"docs/sub/"` becomes `"sub"`, `"docs/readme.txt"` becomes `"readme.txt"`.
pub fn display_name(key: &str) -> &str {
    let clean = key.strip_suffix(DELIMITER).unwrap_or(key);
    match clean.rsplit(DELIMITER).next() {
        Some(last) if !last.is_empty() => last,
        _ => clean,
    }
}

/// Human readable byte size with one decimal place (`B`, `KB`, `MB`, `GB`).
///
/// Zero renders as an empty string, matching how the listing hides sizes of
/// empty files.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return String::new();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
