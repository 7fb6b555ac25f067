//! Vector store boundary: persistable documents and the store capability

use crate::model::{EdgeMap, NodeId, Position};
use crate::symbols::SymbolTable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// The persistable unit. Ids and paths are workspace-relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file_path: String,
    pub start: Position,
    pub end: Position,
    pub related_files: Vec<String>,
    pub parent_id: Option<String>,
}

/// Storage and embedding backend.
///
/// The store owns durability; callers never retry a failed save.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Commit documents together with the current edge maps and symbol table.
    ///
    /// `incremental == false` asks for the bulk consistency pass of a full build.
    async fn save(
        &self,
        documents: Vec<IndexDocument>,
        import_edges: &EdgeMap,
        export_edges: &EdgeMap,
        symbol_table: &SymbolTable,
        incremental: bool,
    ) -> anyhow::Result<()>;

    async fn delete_documents(&self, ids: &[NodeId]) -> anyhow::Result<()>;

    async fn find_documents_by_path(&self, paths: &[String]) -> anyhow::Result<Vec<IndexDocument>>;

    fn name(&self) -> &str;
}

/// One recorded `save` call.
#[derive(Debug, Clone)]
pub struct SaveRecord {
    pub document_ids: Vec<String>,
    pub import_edges: EdgeMap,
    pub export_edges: EdgeMap,
    pub symbol_table: SymbolTable,
    pub incremental: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<String, IndexDocument>,
    import_edges: EdgeMap,
    export_edges: EdgeMap,
    symbol_table: SymbolTable,
    saves: Vec<SaveRecord>,
    deletes: Vec<Vec<NodeId>>,
}

/// In-process store that keeps everything in a map and records each call.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    state: Mutex<MemoryState>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self) -> Vec<IndexDocument> {
        self.state.lock().await.documents.values().cloned().collect()
    }

    pub async fn document(&self, id: &str) -> Option<IndexDocument> {
        self.state.lock().await.documents.get(id).cloned()
    }

    pub async fn saves(&self) -> Vec<SaveRecord> {
        self.state.lock().await.saves.clone()
    }

    pub async fn deletes(&self) -> Vec<Vec<NodeId>> {
        self.state.lock().await.deletes.clone()
    }

    pub async fn import_edges(&self) -> EdgeMap {
        self.state.lock().await.import_edges.clone()
    }

    pub async fn export_edges(&self) -> EdgeMap {
        self.state.lock().await.export_edges.clone()
    }

    pub async fn symbol_table(&self) -> SymbolTable {
        self.state.lock().await.symbol_table.clone()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn save(
        &self,
        documents: Vec<IndexDocument>,
        import_edges: &EdgeMap,
        export_edges: &EdgeMap,
        symbol_table: &SymbolTable,
        incremental: bool,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let document_ids = documents.iter().map(|d| d.id.clone()).collect();
        for document in documents {
            state.documents.insert(document.id.clone(), document);
        }
        if !incremental {
            retain_known(&mut state.documents, symbol_table);
        }
        state.import_edges = import_edges.clone();
        state.export_edges = export_edges.clone();
        state.symbol_table = symbol_table.clone();
        state.saves.push(SaveRecord {
            document_ids,
            import_edges: import_edges.clone(),
            export_edges: export_edges.clone(),
            symbol_table: symbol_table.clone(),
            incremental,
        });
        Ok(())
    }

    async fn delete_documents(&self, ids: &[NodeId]) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        for id in ids {
            state.documents.remove(id.as_str());
        }
        state.deletes.push(ids.to_vec());
        Ok(())
    }

    async fn find_documents_by_path(&self, paths: &[String]) -> anyhow::Result<Vec<IndexDocument>> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .values()
            .filter(|d| paths.contains(&d.metadata.file_path))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Drop documents whose id no file in the symbol table owns.
pub(crate) fn retain_known(documents: &mut BTreeMap<String, IndexDocument>, symbol_table: &SymbolTable) {
    let known: std::collections::HashSet<&str> = symbol_table
        .iter()
        .flat_map(|(_, entry)| entry.node_ids.iter().map(|id| id.as_str()))
        .collect();
    let before = documents.len();
    documents.retain(|id, _| known.contains(id.as_str()));
    let pruned = before - documents.len();
    if pruned > 0 {
        tracing::debug!("Pruned {} orphaned documents", pruned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileEntry;
    use std::collections::BTreeSet;

    fn doc(id: &str, file: &str) -> IndexDocument {
        IndexDocument {
            id: id.to_string(),
            content: format!("skeleton of {id}"),
            metadata: DocumentMetadata {
                file_path: file.to_string(),
                start: Position::new(0, 0),
                end: Position::new(1, 0),
                related_files: vec![],
                parent_id: None,
            },
        }
    }

    #[tokio::test]
    async fn full_build_prunes_unknown_documents() {
        let store = MemoryVectorStore::new();
        let empty = EdgeMap::new();
        store
            .save(vec![doc("old.rs:0:0-1:0", "old.rs")], &empty, &empty, &SymbolTable::new(), true)
            .await
            .unwrap();

        let mut table = SymbolTable::new();
        table.insert(
            "a.rs".into(),
            FileEntry::new(BTreeSet::from([NodeId("a.rs:0:0-1:0".into())]), "x"),
        );
        store
            .save(vec![doc("a.rs:0:0-1:0", "a.rs")], &empty, &empty, &table, false)
            .await
            .unwrap();

        let ids: Vec<_> = store.documents().await.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a.rs:0:0-1:0".to_string()]);
        assert_eq!(store.saves().await.len(), 2);
    }

    #[tokio::test]
    async fn delete_and_find_by_path() {
        let store = MemoryVectorStore::new();
        let empty = EdgeMap::new();
        store
            .save(
                vec![doc("a.rs:0:0-1:0", "a.rs"), doc("b.rs:0:0-1:0", "b.rs")],
                &empty,
                &empty,
                &SymbolTable::new(),
                true,
            )
            .await
            .unwrap();

        let found = store.find_documents_by_path(&["b.rs".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);

        store
            .delete_documents(&[NodeId("b.rs:0:0-1:0".into())])
            .await
            .unwrap();
        assert!(store.document("b.rs:0:0-1:0").await.is_none());
        assert_eq!(store.deletes().await.len(), 1);
    }
}
