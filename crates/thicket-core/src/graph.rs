//! The code graph: symbol table, node registry and import/export adjacency maps

use crate::model::*;
use crate::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Symbol table plus edges, keyed by node id.
///
/// Edges are replaced per file, never patched: import edges belong to the file
/// owning their key, export edges keyed by a foreign node belong to the file
/// whose nodes appear in the value set.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeGraph {
    symbols: SymbolTable,
    nodes: BTreeMap<NodeId, CodeGraphNode>,
    import_edges: EdgeMap,
    export_edges: EdgeMap,
}

impl std::fmt::Debug for CodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGraph")
            .field("file_count", &self.symbols.len())
            .field("node_count", &self.nodes.len())
            .field("import_edge_count", &edge_count(&self.import_edges))
            .field("export_edge_count", &edge_count(&self.export_edges))
            .finish()
    }
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol-table entry for a workspace-relative path.
    pub fn get_file_entry(&self, relative_path: &str) -> Option<&FileEntry> {
        self.symbols.get(relative_path)
    }

    /// Replace a file's entry, nodes and edges in one step.
    ///
    /// Nodes and import edges keyed by an id of the previous (or new) entry
    /// are dropped and the file's ids are withdrawn from export sets before
    /// the new edges go in. Export edges keyed by the file's own nodes belong
    /// to their importers and are left alone. Returns the previous entry.
    pub fn update_file_with_edges(
        &mut self,
        relative_path: &str,
        entry: FileEntry,
        nodes: Vec<CodeGraphNode>,
        import_edges: EdgeMap,
        export_edges: EdgeMap,
    ) -> Option<FileEntry> {
        let previous = self.symbols.get(relative_path).cloned();

        let mut stale: BTreeSet<NodeId> = entry.node_ids.clone();
        if let Some(previous) = &previous {
            stale.extend(previous.node_ids.iter().cloned());
        }
        self.withdraw(&stale);

        for node in nodes {
            if entry.node_ids.contains(&node.id) {
                self.nodes.insert(node.id.clone(), node);
            }
        }
        for (source, targets) in import_edges {
            if !targets.is_empty() {
                self.import_edges.insert(source, targets);
            }
        }
        for (source, targets) in export_edges {
            if !targets.is_empty() {
                self.export_edges.entry(source).or_default().extend(targets);
            }
        }

        self.symbols.insert(relative_path.to_string(), entry);
        previous
    }

    /// Drop a file's entry, its nodes and every edge keyed by its node ids.
    pub fn remove_file(&mut self, relative_path: &str) -> Option<FileEntry> {
        let entry = self.symbols.remove(relative_path)?;
        self.withdraw(&entry.node_ids);
        for id in &entry.node_ids {
            self.export_edges.remove(id);
        }
        Some(entry)
    }

    /// Make a file stale without touching its nodes or edges.
    ///
    /// The next pass that reaches it reparses it. Returns false for unknown files.
    pub fn invalidate_file(&mut self, relative_path: &str) -> bool {
        match self.symbols.get_mut(relative_path) {
            Some(entry) => {
                entry.sha.clear();
                true
            }
            None => false,
        }
    }

    /// Forget nodes and import edges keyed by `ids` and pull `ids` out of every export set.
    fn withdraw(&mut self, ids: &BTreeSet<NodeId>) {
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.nodes.remove(id);
            self.import_edges.remove(id);
        }
        self.export_edges.retain(|_, targets| {
            targets.retain(|target| !ids.contains(target));
            !targets.is_empty()
        });
    }

    /// Ids a node imports from.
    pub fn get_import_edge(&self, id: &NodeId) -> Option<&BTreeSet<NodeId>> {
        self.import_edges.get(id)
    }

    /// Ids a node exports to.
    pub fn get_export_edge(&self, id: &NodeId) -> Option<&BTreeSet<NodeId>> {
        self.export_edges.get(id)
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&CodeGraphNode> {
        self.nodes.get(id)
    }

    /// Nodes a node imports from, skipping ids the graph no longer knows.
    pub fn related_nodes(&self, id: &NodeId) -> Vec<CodeGraphNode> {
        self.get_import_edge(id)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|target| self.nodes.get(target).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn import_edges(&self) -> &EdgeMap {
        &self.import_edges
    }

    pub fn export_edges(&self) -> &EdgeMap {
        &self.export_edges
    }

    pub fn file_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of import relationships.
    pub fn edge_count(&self) -> usize {
        edge_count(&self.import_edges)
    }

    /// Copy of the graph with every node id and node path mapped.
    pub fn projected(
        &self,
        map_id: impl Fn(&NodeId) -> NodeId,
        map_path: impl Fn(&Path) -> PathBuf,
    ) -> CodeGraph {
        let mut symbols = SymbolTable::new();
        for (path, entry) in self.symbols.iter() {
            symbols.insert(
                path.clone(),
                FileEntry::new(entry.node_ids.iter().map(&map_id).collect(), entry.sha.clone()),
            );
        }

        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let node = CodeGraphNode {
                    id: map_id(&node.id),
                    kind: node.kind,
                    name: node.name.clone(),
                    location: Location::new(map_path(&node.location.path), node.location.range),
                    parent_node_id: node.parent_node_id.as_ref().map(&map_id),
                };
                (node.id.clone(), node)
            })
            .collect();

        CodeGraph {
            symbols,
            nodes,
            import_edges: project_edges(&self.import_edges, &map_id),
            export_edges: project_edges(&self.export_edges, &map_id),
        }
    }
}

/// Map both ends of every edge.
pub fn project_edges(edges: &EdgeMap, map_id: impl Fn(&NodeId) -> NodeId) -> EdgeMap {
    edges
        .iter()
        .map(|(source, targets)| (map_id(source), targets.iter().map(&map_id).collect()))
        .collect()
}

fn edge_count(edges: &EdgeMap) -> usize {
    edges.values().map(|targets| targets.len()).sum()
}
