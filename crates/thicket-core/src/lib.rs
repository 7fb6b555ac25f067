//! Thicket core: code graph, symbol table, documents and the vector-store boundary

pub mod cache;
pub mod digest;
pub mod document;
pub mod graph;
pub mod json_store;
pub mod model;
pub mod store;
pub mod symbols;
pub mod workspace;


#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CACHE_DIR, GRAPH_CACHE, cache_dir, clear_cache, ensure_cache_dir, graph_cache_path, load_graph, save_graph};
pub use digest::{content_digest, read_with_digest};
pub use document::{DocumentCache, TextDocument, offset_within};
pub use graph::CodeGraph;
pub use json_store::JsonVectorStore;
pub use model::{
    CodeGraphNode, EdgeMap, FileEntry, Language, Location, NodeId, NodeKind, Position, Range,
    SkeletonizedNode,
};
pub use store::{DocumentMetadata, IndexDocument, MemoryVectorStore, SaveRecord, VectorStore};
pub use symbols::SymbolTable;
pub use workspace::Workspace;
