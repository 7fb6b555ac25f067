//! Error taxonomy of an indexing pass

use std::path::PathBuf;
use thicket_parser::ParseError;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The file vanished between being queued and being read.
    #[error("document unavailable: {path}")]
    DocumentUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("skeleton generation failed for {node}: {source}")]
    Generation {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    /// Store commit or delete failed. Never swallowed by the batch loop.
    #[error("vector store {store} failed: {source}")]
    Persistence {
        store: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("an indexing pass is already running")]
    AlreadySyncing,

    #[error("{0} is outside the workspace")]
    OutsideWorkspace(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IndexError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, IndexError::Persistence { .. })
    }
}
