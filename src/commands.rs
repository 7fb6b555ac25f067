//! CLI command implementations

use anyhow::Context;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thicket_ai::create_generator;
use thicket_core::{JsonVectorStore, Workspace, cache_dir, load_graph};
use thicket_parser::{ParserPool, TreeSitterParser};
use thicket_sync::{IndexObserver, Indexer, IndexerConfig, WatcherService, discover_files};

const STORE_DIR: &str = "store";

struct LoggingObserver;

#[async_trait::async_trait]
impl IndexObserver for LoggingObserver {
    fn on_file_processing(&self, relative_path: &str) {
        tracing::debug!("Processing {}", relative_path);
    }

    async fn on_file_removed(&self, file_path: &Path) {
        tracing::info!("Removed {}", file_path.display());
    }
}

fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    std::fs::canonicalize(root).with_context(|| format!("Cannot open workspace {}", root.display()))
}

async fn build_indexer(root: &Path) -> anyhow::Result<Indexer> {
    let config = IndexerConfig::load(root)?;
    let parser = TreeSitterParser::new(ParserPool::new(config.parser_workers), root);
    let generator = create_generator(&config.generator)?;
    let store = JsonVectorStore::open(cache_dir(root).join(STORE_DIR)).await?;
    tracing::info!("Using {} generator, store at {}", generator.name(), store.dir().display());

    let indexer = Indexer::new(Workspace::new(root), config, Arc::new(parser), generator, Arc::new(store))?
        .with_observer(Arc::new(LoggingObserver));
    if indexer.restore_cache().await? {
        tracing::debug!("Resuming from graph snapshot");
    }
    Ok(indexer)
}

/// Every included source file plus every file the graph already knows, so
/// files deleted since the last run are removed.
async fn workspace_files(indexer: &Indexer) -> Vec<PathBuf> {
    let workspace = indexer.workspace();
    let mut files: BTreeSet<PathBuf> = discover_files(workspace, indexer.filter()).into_iter().collect();
    let graph = indexer.graph();
    let graph = graph.read().await;
    files.extend(graph.symbol_table().iter().map(|(relative, _)| workspace.absolute(relative)));
    files.into_iter().collect()
}

pub async fn index(root: PathBuf, paths: Vec<PathBuf>, full: bool) -> anyhow::Result<()> {
    let root = canonical_root(&root)?;
    tracing::info!("Indexing workspace: {}", root.display());
    let indexer = build_indexer(&root).await?;

    let (paths, full) = if paths.is_empty() {
        (workspace_files(&indexer).await, true)
    } else {
        (paths, full)
    };
    let stats = indexer.index(&paths, full).await?;
    println!("{stats}");
    Ok(())
}

pub async fn watch(root: PathBuf) -> anyhow::Result<()> {
    let root = canonical_root(&root)?;
    let indexer = build_indexer(&root).await?;
    let files = workspace_files(&indexer).await;
    let stats = indexer.index(&files, true).await?;
    tracing::info!("Initial index: {}", stats);

    let mut service = WatcherService::new(Arc::new(indexer))?;
    service.start_watching()?;
    tokio::select! {
        result = service.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Stopping watcher");
            Ok(())
        }
    }
}

pub async fn status(root: PathBuf) -> anyhow::Result<()> {
    let root = canonical_root(&root)?;
    let Some(graph) = load_graph(&root)? else {
        println!("No graph snapshot in {}", cache_dir(&root).display());
        return Ok(());
    };
    println!("Files: {}", graph.file_count());
    println!("Nodes: {}", graph.node_count());
    println!("Import edges: {}", graph.edge_count());

    let store_dir = cache_dir(&root).join(STORE_DIR);
    if store_dir.exists() {
        let store = JsonVectorStore::open(store_dir).await?;
        println!("Documents: {}", store.document_count().await);
    }
    Ok(())
}

pub fn clear(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("Clearing cache for: {}", root.display());

    thicket_core::clear_cache(&root)?;

    tracing::info!("Cache cleared");
    Ok(())
}
