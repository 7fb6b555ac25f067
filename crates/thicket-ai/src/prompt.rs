//! Prompt templates for skeleton generation

use std::path::{Path, PathBuf};
use thicket_core::{CodeGraphNode, DocumentCache, NodeKind};

/// A related node reduced to what a prompt needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedSnippet {
    pub path: PathBuf,
    pub kind: NodeKind,
    pub name: String,
    /// First non-empty source line of the node
    pub head: String,
}

/// Resolve related nodes to snippets, reading their documents through the cache.
pub async fn related_snippets(related: &[CodeGraphNode], documents: &DocumentCache) -> Vec<RelatedSnippet> {
    let mut snippets = Vec::with_capacity(related.len());
    for node in related {
        let head = match documents.get_or_load(&node.location.path).await {
            Ok(document) => document
                .text_in_range(&node.location.range)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                tracing::debug!("Related document {} unavailable: {}", node.location.path.display(), e);
                String::new()
            }
        };
        snippets.push(RelatedSnippet {
            path: node.location.path.clone(),
            kind: node.kind,
            name: node.name.clone(),
            head,
        });
    }
    snippets
}

/// Generate a prompt asking for the skeleton of one node
pub fn skeleton_prompt(file_path: &Path, node: &CodeGraphNode, code_block: &str, related: &[RelatedSnippet]) -> String {
    let related_desc = if related.is_empty() {
        "None.".to_string()
    } else {
        related
            .iter()
            .map(|r| format!("- {:?} {} ({}): {}", r.kind, r.name, r.path.display(), r.head))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Condense this {kind:?} into a skeleton.

File: {file}
Name: {name}
Lines: {start}-{end}

Code:
```
{code}
```

Imported from:
{related_desc}

Keep every signature, type, field and doc comment. Replace function bodies with a one-line comment describing what they do. Keep already condensed parts unchanged. Return only code."#,
        kind = node.kind,
        file = file_path.display(),
        name = node.name,
        start = node.location.range.start.line + 1,
        end = node.location.range.end.line + 1,
        code = code_block,
    )
}

/// System prompt for skeleton generation
pub const SKELETON_SYSTEM_PROMPT: &str = r#"You are an expert code summarizer. You turn source code into compact skeletons used for semantic search.
Preserve names and signatures exactly. Never invent APIs. Answer with code only, no prose and no markdown fences."#;
