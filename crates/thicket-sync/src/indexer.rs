//! Indexing passes: change detection, blast radius, skeletonization and commit

use crate::assembly::{build_documents, relative_graph};
use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::filter::InclusionFilter;
use crate::skeletonizer::Skeletonizer;
use futures_util::future::join_all;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thicket_ai::SkeletonGenerator;
use thicket_core::{
    CodeGraph, CodeGraphNode, FileEntry, NodeId, TextDocument, VectorStore, Workspace, load_graph,
    read_with_digest, save_graph,
};
use thicket_parser::{CodeParser, ParseError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Hooks around file processing. Both default to doing nothing.
#[async_trait::async_trait]
pub trait IndexObserver: Send + Sync {
    /// A stale file is about to be parsed.
    fn on_file_processing(&self, _relative_path: &str) {}

    /// A deleted file has been dropped from the graph and the store.
    async fn on_file_removed(&self, _file_path: &Path) {}
}

struct NoopObserver;

impl IndexObserver for NoopObserver {}

/// Counters of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub files_removed: usize,
    pub documents_saved: usize,
    pub failed: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} parsed, {} current, {} removed, {} documents saved, {} failed",
            self.files_parsed, self.files_skipped, self.files_removed, self.documents_saved, self.failed
        )
    }
}

/// State of one pass.
#[derive(Default)]
struct Pass {
    visited: HashSet<PathBuf>,
    /// Digests recorded by visits completed earlier in this pass
    settled: HashMap<String, String>,
    changed: bool,
    stats: IndexStats,
}

/// Nodes of one reparsed file awaiting skeletonization.
struct FileWork {
    relative_path: String,
    document: TextDocument,
    nodes: Vec<CodeGraphNode>,
}

/// Resets the syncing flag however the pass ends.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| IndexError::AlreadySyncing)?;
        Ok(Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps a workspace's code graph and vector store in step with the files on disk.
pub struct Indexer {
    workspace: Workspace,
    config: IndexerConfig,
    parser: Arc<dyn CodeParser>,
    skeletonizer: Skeletonizer,
    store: Arc<dyn VectorStore>,
    graph: Arc<RwLock<CodeGraph>>,
    filter: InclusionFilter,
    syncing: AtomicBool,
    observer: Arc<dyn IndexObserver>,
}

impl Indexer {
    pub fn new(
        workspace: Workspace,
        config: IndexerConfig,
        parser: Arc<dyn CodeParser>,
        generator: Arc<dyn SkeletonGenerator>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        config.validate()?;
        let filter = InclusionFilter::new(workspace.clone(), &config.include)
            .map_err(|e| IndexError::Config(e.to_string()))?;
        Ok(Self {
            skeletonizer: Skeletonizer::new(parser.clone(), generator),
            workspace,
            config,
            parser,
            store,
            graph: Arc::new(RwLock::new(CodeGraph::new())),
            filter,
            syncing: AtomicBool::new(false),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn IndexObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn graph(&self) -> Arc<RwLock<CodeGraph>> {
        self.graph.clone()
    }

    pub fn filter(&self) -> &InclusionFilter {
        &self.filter
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Drop cached include-pattern matches after files appear or disappear.
    pub fn clear_filter_cache(&self) {
        self.filter.clear_cache();
    }

    /// Load the local snapshot, if any. Returns whether one was restored.
    pub async fn restore_cache(&self) -> Result<bool> {
        let root = self.workspace.root().to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || load_graph(&root))
            .await
            .map_err(|e| IndexError::Io(std::io::Error::other(e)))?
            .map_err(|e| IndexError::Io(std::io::Error::other(e)))?;
        let Some(relative) = loaded else {
            return Ok(false);
        };
        let graph = relative.projected(
            |id| self.workspace.absolute_id(id),
            |p| self.workspace.absolute_path_buf(p),
        );
        info!("Restored graph snapshot: {} files, {} nodes", graph.file_count(), graph.node_count());
        *self.graph.write().await = graph;
        Ok(true)
    }

    /// Run one pass over `identifiers` (absolute or workspace-relative).
    ///
    /// `full_build` asks the store for its bulk consistency pass. Failures of
    /// single identifiers are logged and counted; only store failures end the pass.
    pub async fn index(&self, identifiers: &[PathBuf], full_build: bool) -> Result<IndexStats> {
        let _guard = SyncGuard::acquire(&self.syncing)?;
        let mut pass = Pass::default();
        info!("Indexing {} documents (full build: {})", identifiers.len(), full_build);

        for identifier in identifiers {
            let path = self.workspace.resolve_identifier(identifier);
            if pass.visited.contains(&path) {
                continue;
            }
            match self.index_identifier(&path, full_build, &mut pass).await {
                Ok(()) => {}
                Err(e) if e.is_persistence() => return Err(e),
                Err(e) => {
                    warn!("Failed to index {}: {}", path.display(), e);
                    pass.stats.failed += 1;
                }
            }
        }

        if pass.changed && self.config.persist_graph {
            self.save_snapshot().await;
        }
        info!("Indexing finished: {}", pass.stats);
        Ok(pass.stats)
    }

    async fn index_identifier(&self, path: &Path, full_build: bool, pass: &mut Pass) -> Result<()> {
        let relative_path = self
            .workspace
            .relative_path(path)
            .ok_or_else(|| IndexError::OutsideWorkspace(path.to_path_buf()))?;

        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => {
                debug!("Skipping directory {}", relative_path);
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                pass.visited.insert(path.to_path_buf());
                return self.remove_document(path, &relative_path, pass).await;
            }
            Err(e) => return Err(e.into()),
        }

        let mut frontier = VecDeque::from([path.to_path_buf()]);
        let mut collected: Vec<FileWork> = Vec::new();
        while let Some(current) = frontier.pop_front() {
            if !pass.visited.insert(current.clone()) {
                continue;
            }
            match self.visit(&current, pass, &mut frontier).await {
                Ok(Some(work)) => collected.push(work),
                Ok(None) => {}
                Err(e) if current == path => return Err(e),
                Err(IndexError::DocumentUnavailable { path: gone, .. }) => {
                    debug!("Dependency {} vanished, skipping", gone.display());
                }
                Err(e) => warn!("Skipping dependency {}: {}", current.display(), e),
            }
        }

        if collected.is_empty() {
            return Ok(());
        }
        self.commit(collected, full_build, pass).await
    }

    /// Process one frontier member. Returns the nodes to skeletonize when it was reparsed.
    async fn visit(&self, path: &Path, pass: &mut Pass, frontier: &mut VecDeque<PathBuf>) -> Result<Option<FileWork>> {
        let relative_path = self
            .workspace
            .relative_path(path)
            .ok_or_else(|| IndexError::OutsideWorkspace(path.to_path_buf()))?;
        let (text, digest) = read_document(path).await?;

        if self.is_current(&relative_path, &digest, pass).await {
            debug!("{} is current", relative_path);
            pass.stats.files_skipped += 1;
            let recorded = self.recorded_imports(&relative_path).await;
            self.expand(recorded, pass, frontier).await;
            return Ok(None);
        }

        self.observer.on_file_processing(&relative_path);
        let document = TextDocument::new(path, text);
        let parsed = self.parser.create_nodes_from_document(&document).await?;
        pass.stats.files_parsed += 1;
        if parsed.is_empty() {
            debug!("No nodes in {}", relative_path);
            return Ok(None);
        }

        let mut nodes = Vec::with_capacity(parsed.nodes.len());
        let mut foreign = BTreeSet::new();
        for node in parsed.nodes {
            if node.is_in(path) {
                nodes.push(node);
            } else {
                foreign.insert(node.location.path.clone());
            }
        }
        self.expand(foreign, pass, frontier).await;

        let node_ids = nodes.iter().map(|n| n.id.clone()).collect();
        let entry = FileEntry::new(node_ids, digest.clone());
        self.graph.write().await.update_file_with_edges(
            &relative_path,
            entry,
            nodes.clone(),
            parsed.import_edges,
            parsed.export_edges,
        );
        debug!("Updated {} ({} nodes)", relative_path, nodes.len());
        pass.settled.insert(relative_path.clone(), digest);
        pass.changed = true;

        Ok(Some(FileWork {
            relative_path,
            document,
            nodes,
        }))
    }

    async fn is_current(&self, relative_path: &str, digest: &str, pass: &Pass) -> bool {
        if pass.settled.get(relative_path).is_some_and(|d| d == digest) {
            return true;
        }
        self.graph
            .read()
            .await
            .get_file_entry(relative_path)
            .is_some_and(|entry| entry.sha == digest)
    }

    /// Files the recorded import edges of a file point at.
    async fn recorded_imports(&self, relative_path: &str) -> BTreeSet<PathBuf> {
        let graph = self.graph.read().await;
        let Some(entry) = graph.get_file_entry(relative_path) else {
            return BTreeSet::new();
        };
        entry
            .node_ids
            .iter()
            .filter_map(|id| graph.get_import_edge(id))
            .flatten()
            .map(|target| PathBuf::from(target.path()))
            .collect()
    }

    /// Queue the stale, included files among `paths`.
    async fn expand(&self, paths: BTreeSet<PathBuf>, pass: &Pass, frontier: &mut VecDeque<PathBuf>) {
        let candidates: Vec<(PathBuf, String)> = paths
            .into_iter()
            .filter(|p| !pass.visited.contains(p) && !frontier.contains(p))
            .filter_map(|p| {
                let relative = self.workspace.relative_path(&p)?;
                Some((p, relative))
            })
            .collect();
        let digests = join_all(candidates.iter().map(|(p, _)| read_with_digest(p))).await;

        for ((path, relative_path), read) in candidates.into_iter().zip(digests) {
            let digest = match read {
                Ok((_, digest)) => digest,
                Err(e) => {
                    debug!("Cannot read dependency {}: {}", path.display(), e);
                    continue;
                }
            };
            if self.is_current(&relative_path, &digest, pass).await {
                continue;
            }
            if !self.filter.matches(&relative_path) {
                debug!("{} is stale but not included", relative_path);
                continue;
            }
            debug!("Blast radius reaches {}", relative_path);
            frontier.push_back(path);
        }
    }

    /// Skeletonize every collected file on its own and save the ones that
    /// succeeded. Failed files are left stale for the next pass.
    async fn commit(&self, collected: Vec<FileWork>, full_build: bool, pass: &mut Pass) -> Result<()> {
        let mut skeletons = Vec::new();
        let mut failures: Vec<(String, IndexError)> = Vec::new();
        {
            let graph = self.graph.read().await;
            for work in collected {
                match self.skeletonizer.skeletonize(work.document, &work.nodes, &graph).await {
                    Ok(done) => skeletons.extend(done),
                    Err(e) => failures.push((work.relative_path, e)),
                }
            }
        }

        if !failures.is_empty() {
            let mut graph = self.graph.write().await;
            for (relative_path, e) in &failures {
                graph.invalidate_file(relative_path);
                pass.settled.remove(relative_path);
                warn!("Skeletonizing {} failed: {}", relative_path, e);
            }
        }

        if !skeletons.is_empty() {
            let (documents, relative) = {
                let graph = self.graph.read().await;
                (
                    build_documents(&self.workspace, &skeletons, &graph),
                    relative_graph(&self.workspace, &graph),
                )
            };
            let count = documents.len();
            self.store
                .save(
                    documents,
                    &relative.import_edges,
                    &relative.export_edges,
                    &relative.symbol_table,
                    !full_build,
                )
                .await
                .map_err(|source| self.persistence_error(source))?;
            pass.stats.documents_saved += count;
            debug!("Saved {} documents to {}", count, self.store.name());
        }

        match failures.into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }

    async fn remove_document(&self, path: &Path, relative_path: &str, pass: &mut Pass) -> Result<()> {
        let removed = self.graph.write().await.remove_file(relative_path);
        let known = removed.is_some();
        let ids: Vec<NodeId> = match removed {
            Some(entry) => entry.node_ids.iter().map(|id| self.workspace.relative_id(id)).collect(),
            None => self
                .store
                .find_documents_by_path(&[relative_path.to_string()])
                .await
                .map_err(|source| self.persistence_error(source))?
                .into_iter()
                .map(|document| NodeId(document.id))
                .collect(),
        };
        if !known && ids.is_empty() {
            debug!("{} is gone and was never indexed", relative_path);
            return Ok(());
        }

        if !ids.is_empty() {
            self.store
                .delete_documents(&ids)
                .await
                .map_err(|source| self.persistence_error(source))?;
        }
        info!("Removed {} ({} documents)", relative_path, ids.len());
        pass.changed |= known;
        pass.stats.files_removed += 1;
        self.observer.on_file_removed(path).await;
        Ok(())
    }

    async fn save_snapshot(&self) {
        let relative = self.graph.read().await.projected(
            |id| self.workspace.relative_id(id),
            |p| self.workspace.relative_path_buf(p),
        );
        let root = self.workspace.root().to_path_buf();
        match tokio::task::spawn_blocking(move || save_graph(&relative, &root)).await {
            Ok(Ok(())) => debug!("Saved graph snapshot"),
            Ok(Err(e)) => warn!("Failed to save graph snapshot: {}", e),
            Err(e) => warn!("Graph snapshot task failed: {}", e),
        }
    }

    fn persistence_error(&self, source: anyhow::Error) -> IndexError {
        IndexError::Persistence {
            store: self.store.name().to_string(),
            source,
        }
    }
}

/// Read a file and its digest, telling vanished files from undecodable ones.
async fn read_document(path: &Path) -> Result<(String, String)> {
    read_with_digest(path).await.map_err(|source| match source.kind() {
        std::io::ErrorKind::InvalidData => IndexError::Parse(ParseError::Encoding {
            path: path.to_path_buf(),
            reason: source.to_string(),
        }),
        _ => IndexError::DocumentUnavailable {
            path: path.to_path_buf(),
            source,
        },
    })
}
