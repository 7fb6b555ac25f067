//! Directory-backed vector store writing plain JSON files

use crate::model::{EdgeMap, NodeId};
use crate::store::{IndexDocument, VectorStore, retain_known};
use crate::symbols::SymbolTable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const DOCUMENTS_FILE: &str = "documents.json";
pub const EDGES_FILE: &str = "edges.json";
pub const SYMBOLS_FILE: &str = "symbols.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize)]
struct EdgesFile<'a> {
    import_edges: &'a EdgeMap,
    export_edges: &'a EdgeMap,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub updated_at: String,
    pub document_count: usize,
    pub file_count: usize,
}

/// Stores documents, edges and the symbol table as JSON under one directory.
pub struct JsonVectorStore {
    dir: PathBuf,
    documents: Mutex<BTreeMap<String, IndexDocument>>,
}

impl JsonVectorStore {
    /// Open (or create) a store directory, loading any existing documents.
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(DOCUMENTS_FILE);
        let documents = if path.exists() {
            let json = tokio::fs::read_to_string(&path).await?;
            let list: Vec<IndexDocument> = serde_json::from_str(&json)?;
            list.into_iter().map(|d| (d.id.clone(), d)).collect()
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Opened JSON store at {} ({} documents)", dir.display(), documents.len());

        Ok(JsonVectorStore {
            dir,
            documents: Mutex::new(documents),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }

    async fn write_json<T: Serialize + Sync + ?Sized>(&self, file: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_documents(&self, documents: &BTreeMap<String, IndexDocument>) -> anyhow::Result<()> {
        let list: Vec<&IndexDocument> = documents.values().collect();
        self.write_json(DOCUMENTS_FILE, &list).await
    }
}

#[async_trait]
impl VectorStore for JsonVectorStore {
    async fn save(
        &self,
        documents: Vec<IndexDocument>,
        import_edges: &EdgeMap,
        export_edges: &EdgeMap,
        symbol_table: &SymbolTable,
        incremental: bool,
    ) -> anyhow::Result<()> {
        let mut stored = self.documents.lock().await;
        let saved = documents.len();
        for document in documents {
            stored.insert(document.id.clone(), document);
        }
        if !incremental {
            retain_known(&mut stored, symbol_table);
        }

        self.write_documents(&stored).await?;
        self.write_json(
            EDGES_FILE,
            &EdgesFile {
                import_edges,
                export_edges,
            },
        )
        .await?;
        self.write_json(SYMBOLS_FILE, symbol_table).await?;
        self.write_json(
            MANIFEST_FILE,
            &Manifest {
                version: env!("CARGO_PKG_VERSION").to_string(),
                updated_at: chrono::Utc::now().to_rfc3339(),
                document_count: stored.len(),
                file_count: symbol_table.len(),
            },
        )
        .await?;

        tracing::debug!(
            "JSON store committed {} documents ({} total)",
            saved,
            stored.len()
        );
        Ok(())
    }

    async fn delete_documents(&self, ids: &[NodeId]) -> anyhow::Result<()> {
        let mut stored = self.documents.lock().await;
        let before = stored.len();
        for id in ids {
            stored.remove(id.as_str());
        }
        if stored.len() != before {
            self.write_documents(&stored).await?;
        }
        Ok(())
    }

    async fn find_documents_by_path(&self, paths: &[String]) -> anyhow::Result<Vec<IndexDocument>> {
        let stored = self.documents.lock().await;
        Ok(stored
            .values()
            .filter(|d| paths.contains(&d.metadata.file_path))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "json"
    }
}
