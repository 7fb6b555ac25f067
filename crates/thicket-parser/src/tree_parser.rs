//! Tree-sitter backed [`CodeParser`]

use crate::languages::{self, Extraction};
use crate::parser::{CodeParser, ParseError, ParsedDocument};
use crate::parser_pool::{FileType, ParseRequest, ParseResult, ParserPool, create_parser_pool};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thicket_core::{CodeGraphNode, Location, NodeId, NodeKind, TextDocument};

/// Parses Rust, Python, TypeScript and JavaScript into file and definition
/// nodes, with import edges to the file nodes of resolved local imports.
#[derive(Debug, Clone)]
pub struct TreeSitterParser {
    pool: ParserPool,
    root: PathBuf,
}

impl TreeSitterParser {
    pub fn new(pool: ParserPool, root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            root: root.into(),
        }
    }

    pub fn with_default_pool(root: impl Into<PathBuf>) -> Self {
        Self::new(create_parser_pool(), root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn extract(&self, file_type: FileType, parsed: ParseResult) -> Result<Extraction, ParseError> {
        let root = parsed.tree.root_node();
        if root.kind() == "ERROR" {
            return Err(ParseError::Syntax {
                path: parsed.path,
                reason: "no recognizable syntax".to_string(),
            });
        }
        if root.has_error() {
            tracing::debug!("Syntax errors in {}, extracting what parsed", parsed.path.display());
        }
        let extractor = languages::get_extractor(file_type);
        Ok(languages::extract(extractor, &parsed.tree, &parsed.content))
    }

    /// File node of an imported document, built from that document's own text
    /// so its id matches the one produced when the document itself is parsed.
    async fn foreign_file_node(path: &Path) -> Option<CodeGraphNode> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let document = TextDocument::new(path, text);
                Some(file_node(&document))
            }
            Err(e) => {
                tracing::debug!("Skipping import of unreadable {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn file_node(document: &TextDocument) -> CodeGraphNode {
    let name = document
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    CodeGraphNode::new(
        NodeKind::File,
        name,
        Location::new(document.path.clone(), document.full_range()),
        None,
    )
}

#[async_trait]
impl CodeParser for TreeSitterParser {
    async fn create_nodes_from_document(&self, document: &TextDocument) -> Result<ParsedDocument, ParseError> {
        let Some(file_type) = FileType::from_path(&document.path) else {
            tracing::debug!("No grammar for {}", document.path.display());
            return Ok(ParsedDocument::default());
        };
        if document.text.contains('\0') {
            return Err(ParseError::Encoding {
                path: document.path.clone(),
                reason: "contains NUL bytes".to_string(),
            });
        }
        if document.text.trim().is_empty() {
            return Ok(ParsedDocument::default());
        }

        let parsed = self
            .pool
            .parse(ParseRequest {
                file_type,
                content: document.text.clone(),
                path: document.path.clone(),
            })
            .await?;
        let extraction = self.extract(file_type, parsed)?;

        let file = file_node(document);
        let mut nodes = vec![file.clone()];
        let mut definition_ids: Vec<NodeId> = Vec::with_capacity(extraction.definitions.len());
        for definition in &extraction.definitions {
            let parent = definition
                .parent
                .and_then(|i| definition_ids.get(i).cloned())
                .unwrap_or_else(|| file.id.clone());
            let node = CodeGraphNode::new(
                definition.kind,
                definition.name.clone(),
                Location::new(document.path.clone(), definition.range),
                Some(parent),
            );
            definition_ids.push(node.id.clone());
            nodes.push(node);
        }

        let extractor = languages::get_extractor(file_type);
        let mut foreign: HashMap<PathBuf, Option<CodeGraphNode>> = HashMap::new();
        let mut result = ParsedDocument::default();
        for site in &extraction.imports {
            let Some(target) = extractor.resolve_import(&document.path, &site.specifier, &self.root) else {
                continue;
            };
            if target == document.path || FileType::from_path(&target).is_none() {
                continue;
            }
            if !foreign.contains_key(&target) {
                let node = Self::foreign_file_node(&target).await;
                if let Some(node) = &node {
                    nodes.push(node.clone());
                }
                foreign.insert(target.clone(), node);
            }
            let Some(Some(target_node)) = foreign.get(&target) else {
                continue;
            };

            let source = site
                .enclosing
                .and_then(|i| definition_ids.get(i).cloned())
                .unwrap_or_else(|| file.id.clone());
            result
                .import_edges
                .entry(source.clone())
                .or_default()
                .insert(target_node.id.clone());
            result
                .export_edges
                .entry(target_node.id.clone())
                .or_default()
                .insert(source);
        }

        tracing::debug!(
            "Parsed {}: {} definitions, {} imported files",
            document.path.display(),
            definition_ids.len(),
            foreign.values().filter(|n| n.is_some()).count()
        );
        result.nodes = nodes;
        Ok(result)
    }
}
