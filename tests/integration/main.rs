//! Integration tests for Thicket
//!
//! These tests run whole indexing passes with the tree-sitter parser, the
//! local generator and real stores.

use std::path::PathBuf;
use std::sync::Arc;
use thicket_ai::LocalGenerator;
use thicket_core::test_utils::{create_test_repo, write_file};
use thicket_core::{JsonVectorStore, MemoryVectorStore, Workspace, cache_dir, load_graph};
use thicket_parser::{ParserPool, TreeSitterParser};
use thicket_sync::{Indexer, IndexerConfig, discover_files};

fn indexer_for(root: &std::path::Path, store: Arc<dyn thicket_core::VectorStore>, persist_graph: bool) -> Indexer {
    let config = IndexerConfig {
        persist_graph,
        parser_workers: 2,
        ..IndexerConfig::default()
    };
    Indexer::new(
        Workspace::new(root),
        config,
        Arc::new(TreeSitterParser::new(ParserPool::new(2), root)),
        Arc::new(LocalGenerator::new()),
        store,
    )
    .unwrap()
}

/// Index the whole mixed-language test repository
#[tokio::test]
async fn test_full_workspace_index() {
    let repo = create_test_repo();
    let store = Arc::new(MemoryVectorStore::new());
    let indexer = indexer_for(repo.path(), store.clone(), false);

    let files = discover_files(indexer.workspace(), indexer.filter());
    assert_eq!(files.len(), 6);
    let stats = indexer.index(&files, true).await.unwrap();
    assert_eq!(stats.files_parsed, 6);
    assert_eq!(stats.failed, 0);

    let symbols = store.symbol_table().await;
    let mut indexed: Vec<&String> = symbols.iter().map(|(path, _)| path).collect();
    indexed.sort();
    assert_eq!(
        indexed,
        vec!["app/main.py", "app/util.py", "src/index.ts", "src/lib.rs", "src/services/user.ts", "src/utils.rs"]
    );

    let documents = store.documents().await;
    let run = documents
        .iter()
        .find(|d| d.metadata.file_path == "app/main.py" && d.content.starts_with("def run"))
        .unwrap();
    insta::assert_snapshot!(run.content, @r"
    def run():
        ...
    ");
    assert!(run.metadata.related_files.is_empty());

    // the top-level import is keyed by the file node
    let main_py = documents
        .iter()
        .find(|d| d.metadata.file_path == "app/main.py" && d.metadata.parent_id.is_none())
        .unwrap();
    assert_eq!(main_py.metadata.related_files, vec!["app/util.py"]);
    assert!(main_py.content.ends_with("# related: util.py"));

    let index_file = documents
        .iter()
        .find(|d| d.metadata.file_path == "src/index.ts" && d.metadata.parent_id.is_none())
        .unwrap();
    assert_eq!(index_file.metadata.related_files, vec!["src/services/user.ts"]);
    assert!(index_file.content.contains("export function main() { ... }"));

    let lib = documents
        .iter()
        .find(|d| d.metadata.file_path == "src/lib.rs" && d.metadata.parent_id.is_none())
        .unwrap();
    assert_eq!(lib.metadata.related_files, vec!["src/utils.rs"]);
}

/// Editing a dependency and indexing only its importer re-indexes the dependency
#[tokio::test]
async fn test_blast_radius_through_real_imports() {
    let repo = create_test_repo();
    let store = Arc::new(MemoryVectorStore::new());
    let indexer = indexer_for(repo.path(), store.clone(), false);
    let files = discover_files(indexer.workspace(), indexer.filter());
    indexer.index(&files, true).await.unwrap();

    write_file(
        repo.path(),
        "src/services/user.ts",
        "export class UserService {\n    loadUsers() {\n        return [];\n    }\n    saveUser(user) {\n        return user;\n    }\n}\n",
    );
    let stats = indexer.index(&[PathBuf::from("src/index.ts")], false).await.unwrap();
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.files_parsed, 1);

    let documents = store.documents().await;
    assert!(documents.iter().any(|d| d.content.starts_with("saveUser(user) { ... }")));
}

/// The JSON store and graph snapshot survive a restart
#[tokio::test]
async fn test_restart_resumes_from_disk() {
    let repo = create_test_repo();
    let store_dir = cache_dir(repo.path()).join("store");
    let files = {
        let store = Arc::new(JsonVectorStore::open(&store_dir).await.unwrap());
        let indexer = indexer_for(repo.path(), store.clone(), true);
        let files = discover_files(indexer.workspace(), indexer.filter());
        indexer.index(&files, true).await.unwrap();
        assert!(store.document_count().await > 6);
        files
    };

    let snapshot = load_graph(repo.path()).unwrap().unwrap();
    assert_eq!(snapshot.file_count(), 6);
    assert!(snapshot.get_file_entry("src/lib.rs").is_some());

    let store = Arc::new(JsonVectorStore::open(&store_dir).await.unwrap());
    let before = store.document_count().await;
    let indexer = indexer_for(repo.path(), store.clone(), true);
    assert!(indexer.restore_cache().await.unwrap());

    std::fs::remove_file(repo.path().join("app/util.py")).unwrap();
    let stats = indexer.index(&files, true).await.unwrap();
    assert_eq!(stats.files_parsed, 0);
    assert_eq!(stats.files_removed, 1);
    assert_eq!(store.document_count().await, before - 2);
}
