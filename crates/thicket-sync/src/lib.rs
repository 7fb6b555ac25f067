//! Thicket indexing orchestration
//!
//! Decides what to reparse after a change, walks the blast radius through the
//! import graph, composes skeletons bottom-up and commits documents to a
//! vector store.

pub mod assembly;
pub mod config;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod skeletonizer;
pub mod watcher;


pub use assembly::{RelativeGraph, build_documents, relative_graph};
pub use config::{CONFIG_FILE, IndexerConfig};
pub use error::{IndexError, Result};
pub use filter::{InclusionFilter, discover_files};
pub use indexer::{IndexObserver, IndexStats, Indexer};
pub use skeletonizer::Skeletonizer;
pub use watcher::{Batch, FileWatcher, WatchEvent, WatcherService};
