//! Per-file symbol table: node ids and last indexed digest

use crate::model::{FileEntry, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps workspace-relative file paths to their [`FileEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    files: BTreeMap<String, FileEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, relative_path: &str) -> Option<&FileEntry> {
        self.files.get(relative_path)
    }

    pub fn get_mut(&mut self, relative_path: &str) -> Option<&mut FileEntry> {
        self.files.get_mut(relative_path)
    }

    /// Insert or replace a file's entry, returning the previous one.
    pub fn insert(&mut self, relative_path: String, entry: FileEntry) -> Option<FileEntry> {
        self.files.insert(relative_path, entry)
    }

    pub fn remove(&mut self, relative_path: &str) -> Option<FileEntry> {
        self.files.remove(relative_path)
    }

    /// True if the stored digest for the file equals `sha`.
    pub fn is_current(&self, relative_path: &str, sha: &str) -> bool {
        self.files
            .get(relative_path)
            .is_some_and(|entry| entry.sha == sha)
    }

    /// Which file owns a node id.
    pub fn file_of(&self, node_id: &NodeId) -> Option<&str> {
        self.files
            .iter()
            .find(|(_, entry)| entry.node_ids.contains(node_id))
            .map(|(path, _)| path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileEntry)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total node ids across all files.
    pub fn node_count(&self) -> usize {
        self.files.values().map(|e| e.node_ids.len()).sum()
    }
}
