//! Local graph snapshot under `.thicket/`

use crate::graph::CodeGraph;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cache directory: .thicket/
pub const CACHE_DIR: &str = ".thicket";

/// Graph snapshot file
pub const GRAPH_CACHE: &str = "graph.bin";

const SNAPSHOT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    version: String,
    saved_at: String,
    graph: CodeGraph,
}

/// Get cache directory path
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

/// Get graph snapshot file path
pub fn graph_cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join(GRAPH_CACHE)
}

/// Ensure cache directory exists
pub fn ensure_cache_dir(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if !cache.exists() {
        std::fs::create_dir_all(&cache)?;
    }
    Ok(())
}

/// Write the graph snapshot. The graph is expected to be workspace-relative.
pub fn save_graph(graph: &CodeGraph, root: &Path) -> anyhow::Result<()> {
    ensure_cache_dir(root)?;
    let path = graph_cache_path(root);

    let snapshot = GraphSnapshot {
        version: SNAPSHOT_VERSION.to_string(),
        saved_at: chrono::Utc::now().to_rfc3339(),
        graph: graph.clone(),
    };
    let bytes = bincode::serialize(&snapshot)?;

    // Write-then-rename; readers never see a partial file.
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, &path)?;

    tracing::debug!(
        "Graph snapshot saved: {} ({} files)",
        path.display(),
        graph.file_count()
    );
    Ok(())
}

/// Load the graph snapshot, if one exists and matches this version.
pub fn load_graph(root: &Path) -> anyhow::Result<Option<CodeGraph>> {
    let path = graph_cache_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(&path)?;
    let snapshot: GraphSnapshot = match bincode::deserialize(&bytes) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Ignoring unreadable graph snapshot {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    if snapshot.version != SNAPSHOT_VERSION {
        tracing::warn!(
            "Ignoring graph snapshot from version {} (current {})",
            snapshot.version,
            SNAPSHOT_VERSION
        );
        return Ok(None);
    }

    tracing::debug!(
        "Graph snapshot loaded from {} (saved {})",
        path.display(),
        snapshot.saved_at
    );
    Ok(Some(snapshot.graph))
}

/// Clear cache directory
pub fn clear_cache(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if cache.exists() {
        std::fs::remove_dir_all(&cache)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::collections::BTreeSet;

    fn sample_graph() -> CodeGraph {
        let range = Range::new(Position::new(0, 0), Position::new(2, 0));
        let node = CodeGraphNode::new(NodeKind::File, "a.rs", Location::new("a.rs", range), None);
        let mut graph = CodeGraph::new();
        graph.update_file_with_edges(
            "a.rs",
            FileEntry::new(BTreeSet::from([node.id.clone()]), "abc"),
            vec![node],
            EdgeMap::new(),
            EdgeMap::new(),
        );
        graph
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let graph = sample_graph();
        save_graph(&graph, dir.path()).unwrap();
        assert!(graph_cache_path(dir.path()).exists());
        assert_eq!(load_graph(dir.path()).unwrap(), Some(graph));
    }

    #[test]
    fn corrupt_snapshot_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        ensure_cache_dir(dir.path()).unwrap();
        std::fs::write(graph_cache_path(dir.path()), b"not a snapshot").unwrap();
        assert_eq!(load_graph(dir.path()).unwrap(), None);
    }

    #[test]
    fn clear_removes_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        save_graph(&sample_graph(), dir.path()).unwrap();
        clear_cache(dir.path()).unwrap();
        assert!(!cache_dir(dir.path()).exists());
        assert_eq!(load_graph(dir.path()).unwrap(), None);
    }
}
