//! Thread-safe parser pool for tree-sitter parsers
//!
//! Tree-sitter parsers are not Send + Sync, so each worker thread owns one and
//! requests reach it over a channel.

use crate::parser::ParseError;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use thicket_core::Language as SourceLanguage;
use tree_sitter::{Language, Parser};

/// Grammars the pool can load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
}

impl FileType {
    /// Determine file type from file extension; `None` for unsupported files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "rs" => Some(FileType::Rust),
            "ts" | "mts" | "cts" => Some(FileType::TypeScript),
            "tsx" => Some(FileType::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(FileType::JavaScript),
            "py" | "pyi" => Some(FileType::Python),
            _ => None,
        }
    }

    /// Get the tree-sitter language for this file type
    pub fn get_language(&self) -> Language {
        match self {
            FileType::Rust => tree_sitter_rust::LANGUAGE.into(),
            FileType::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            FileType::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            FileType::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            FileType::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }

    pub fn source_language(&self) -> SourceLanguage {
        match self {
            FileType::Rust => SourceLanguage::Rust,
            FileType::TypeScript | FileType::Tsx => SourceLanguage::TypeScript,
            FileType::JavaScript => SourceLanguage::JavaScript,
            FileType::Python => SourceLanguage::Python,
        }
    }
}

/// A parsing request sent to the parser pool
#[derive(Debug)]
pub struct ParseRequest {
    pub file_type: FileType,
    pub content: String,
    pub path: PathBuf,
}

/// Result of a parsing operation
#[derive(Debug)]
pub struct ParseResult {
    pub tree: tree_sitter::Tree,
    pub path: PathBuf,
    pub content: String,
}

type Reply = Result<ParseResult, ParseError>;

/// Internal message for the parser worker
struct WorkerRequest {
    request: ParseRequest,
    response_sender: mpsc::Sender<Reply>,
}

/// Thread-safe parser pool
#[derive(Clone)]
pub struct ParserPool {
    sender: mpsc::Sender<WorkerRequest>,
    workers: usize,
}

impl std::fmt::Debug for ParserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPool").field("workers", &self.workers).finish()
    }
}

impl ParserPool {
    /// Create a new parser pool with the specified number of worker threads
    pub fn new(num_workers: usize) -> Self {
        let workers = num_workers.max(1);
        let (sender, receiver) = mpsc::channel::<WorkerRequest>();
        let receiver = Arc::new(Mutex::new(receiver));

        for i in 0..workers {
            let receiver = receiver.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("thicket-parser-{i}"))
                .spawn(move || Self::worker_thread(i, receiver));
            if let Err(e) = spawned {
                tracing::error!("Failed to start parser worker {}: {}", i, e);
            }
        }

        Self { sender, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker thread function that processes parsing requests
    fn worker_thread(worker_id: usize, receiver: Arc<Mutex<mpsc::Receiver<WorkerRequest>>>) {
        tracing::debug!("Parser worker {} started", worker_id);

        let mut parser = Parser::new();
        let mut loaded: Option<FileType> = None;

        loop {
            let next = {
                let guard = match receiver.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.recv()
            };
            let Ok(WorkerRequest { request, response_sender }) = next else {
                tracing::debug!("Parser worker {} shutting down", worker_id);
                break;
            };

            if loaded != Some(request.file_type) {
                if let Err(e) = parser.set_language(&request.file_type.get_language()) {
                    tracing::warn!("Failed to load grammar for {}: {}", request.path.display(), e);
                    let _ = response_sender.send(Err(ParseError::Unsupported(request.path)));
                    loaded = None;
                    continue;
                }
                loaded = Some(request.file_type);
            }

            let result = match parser.parse(&request.content, None) {
                Some(tree) => Ok(ParseResult {
                    tree,
                    path: request.path,
                    content: request.content,
                }),
                None => Err(ParseError::Syntax {
                    path: request.path,
                    reason: "parser produced no tree".to_string(),
                }),
            };

            if response_sender.send(result).is_err() {
                tracing::warn!("Failed to send parse result back to caller");
            }
        }
    }

    fn dispatch(sender: &mpsc::Sender<WorkerRequest>, request: ParseRequest) -> Reply {
        let (response_sender, response_receiver) = mpsc::channel();
        sender
            .send(WorkerRequest {
                request,
                response_sender,
            })
            .map_err(|_| ParseError::Pool("parser pool is shut down".to_string()))?;
        response_receiver
            .recv()
            .map_err(|_| ParseError::Pool("parser worker died".to_string()))?
    }

    /// Parse content synchronously using the parser pool
    /// Note: This blocks the current thread until parsing is complete
    pub fn parse_blocking(&self, request: ParseRequest) -> Reply {
        Self::dispatch(&self.sender, request)
    }

    /// Parse content asynchronously using the parser pool
    pub async fn parse(&self, request: ParseRequest) -> Reply {
        let sender = self.sender.clone();
        tokio::task::spawn_blocking(move || Self::dispatch(&sender, request))
            .await
            .map_err(|e| ParseError::Pool(format!("task join error: {e}")))?
    }
}

/// Convenience function to create a parser pool with default settings
pub fn create_parser_pool() -> ParserPool {
    ParserPool::new(default_workers())
}

/// Number of CPU cores, but at least 2
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().max(2))
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_path(Path::new("a/main.rs")), Some(FileType::Rust));
        assert_eq!(FileType::from_path(Path::new("app.tsx")), Some(FileType::Tsx));
        assert_eq!(FileType::from_path(Path::new("index.mjs")), Some(FileType::JavaScript));
        assert_eq!(FileType::from_path(Path::new("lib.pyi")), Some(FileType::Python));
        assert_eq!(FileType::from_path(Path::new("README.md")), None);
        assert_eq!(FileType::from_path(Path::new("Makefile")), None);
    }

    #[tokio::test]
    async fn test_parse_rust() {
        let pool = create_parser_pool();
        let content = r#"
fn main() {
    println!("Hello, world!");
}
"#
        .to_string();

        let request = ParseRequest {
            file_type: FileType::Rust,
            content,
            path: PathBuf::from("test.rs"),
        };

        let result = pool.parse(request).await.unwrap();
        assert_eq!(result.tree.root_node().kind(), "source_file");
    }

    #[tokio::test]
    async fn test_parse_typescript_and_python_on_one_worker() {
        let pool = ParserPool::new(1);
        let ts = pool
            .parse(ParseRequest {
                file_type: FileType::TypeScript,
                content: "class MyClass {\n    method() {}\n}\n".to_string(),
                path: PathBuf::from("test.ts"),
            })
            .await
            .unwrap();
        assert_eq!(ts.tree.root_node().kind(), "program");

        let py = pool
            .parse_blocking(ParseRequest {
                file_type: FileType::Python,
                content: "def f():\n    pass\n".to_string(),
                path: PathBuf::from("test.py"),
            })
            .unwrap();
        assert_eq!(py.tree.root_node().kind(), "module");
    }
}
