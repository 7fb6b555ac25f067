//! Core data structures for the code graph

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a node, derived from its location.
///
/// The textual form is `{path}:{start_line}:{start_char}-{end_line}:{end_char}`.
/// In memory the path is absolute; persisted ids use the workspace-relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(path: &Path, range: &Range) -> Self {
        NodeId(format!("{}:{}", path.display(), range))
    }

    /// Build an id from an already-normalized path string.
    pub fn from_path_str(path: &str, range: &Range) -> Self {
        NodeId(format!("{}:{}", path, range))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path part of the id, without the trailing range.
    pub fn path(&self) -> &str {
        self.0.rsplitn(4, ':').nth(3).unwrap_or(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based position. `character` is a UTF-8 byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Half-open source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.character, self.end.line, self.end.character
        )
    }
}

/// Document identifier plus range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, range: Range) -> Self {
        Location {
            path: path.into(),
            range,
        }
    }
}

/// Discriminates what kind of code entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // ── Structural ──────────────────────────────────────────
    File,
    Module,

    // ── Code entities (tree-sitter extracted) ───────────────
    Class,
    Struct,
    Enum,
    Interface,
    Impl,
    Function,
    Method,
    TypeAlias,

    // ── Fallback ────────────────────────────────────────────
    Unknown,
}

impl NodeKind {
    /// Containers keep their (condensed) children when skeletonized.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::File
                | NodeKind::Module
                | NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Impl
                | NodeKind::Enum
                | NodeKind::Struct
        )
    }
}

/// A single node in the code graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeGraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub location: Location,
    pub parent_node_id: Option<NodeId>,
}

impl CodeGraphNode {
    /// Create a node whose id is derived from its location.
    pub fn new(
        kind: NodeKind,
        name: impl Into<String>,
        location: Location,
        parent_node_id: Option<NodeId>,
    ) -> Self {
        CodeGraphNode {
            id: NodeId::new(&location.path, &location.range),
            kind,
            name: name.into(),
            location,
            parent_node_id,
        }
    }

    pub fn is_in(&self, path: &Path) -> bool {
        self.location.path == path
    }
}

/// A node plus the condensed text produced for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkeletonizedNode {
    #[serde(flatten)]
    pub node: CodeGraphNode,
    pub skeleton: String,
}

impl SkeletonizedNode {
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }
}

/// Symbol-table record for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileEntry {
    pub node_ids: BTreeSet<NodeId>,
    /// Content digest of the text that produced `node_ids`.
    pub sha: String,
}

impl FileEntry {
    pub fn new(node_ids: BTreeSet<NodeId>, sha: impl Into<String>) -> Self {
        FileEntry {
            node_ids,
            sha: sha.into(),
        }
    }
}

/// Adjacency map: node id -> ids it imports from (or exports to).
pub type EdgeMap = BTreeMap<NodeId, BTreeSet<NodeId>>;

/// Supported languages for syntax-aware parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("rs") => Language::Rust,
            Some("ts") | Some("tsx") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            _ => Language::Other,
        }
    }

    /// Prefix used for single-line comments.
    pub fn line_comment(self) -> &'static str {
        match self {
            Language::Python => "#",
            _ => "//",
        }
    }
}
