//! Local generator for offline skeletons
//!
//! Containers keep their (already condensed) children; function bodies are
//! collapsed to `{ ... }`, or `...` for Python.

use crate::bridge::SkeletonGenerator;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use thicket_core::{CodeGraphNode, DocumentCache, Language, SkeletonizedNode};

static PY_DOCSTRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*[rRuUbB]{0,2}("""|''')"#).expect("valid docstring regex"));

#[derive(Debug, Default)]
pub struct LocalGenerator;

impl LocalGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Skeleton text without the related-files trailer.
    pub fn condense(language: Language, node: &CodeGraphNode, code_block: &str) -> String {
        if node.kind.is_container() {
            return code_block.to_string();
        }
        match language {
            Language::Python => collapse_python_body(code_block),
            _ => collapse_brace_body(code_block),
        }
    }
}

/// Everything up to the body's opening brace, then `{ ... }`.
fn collapse_brace_body(code: &str) -> String {
    let mut depth = 0i32;
    let mut open = None;
    for (i, c) in code.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' if depth > 0 => depth -= 1,
            '{' if depth == 0 => {
                open = Some(i);
                break;
            }
            ';' if depth == 0 => break,
            _ => {}
        }
    }
    let (Some(open), Some(close)) = (open, code.rfind('}')) else {
        return code.to_string();
    };
    if close < open {
        return code.to_string();
    }
    format!("{} {{ ... }}{}", code[..open].trim_end(), &code[close + 1..])
}

/// The `def` header, an optional docstring, then `...`.
fn collapse_python_body(code: &str) -> String {
    let mut depth = 0i32;
    let mut header_end = None;
    for (i, c) in code.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth > 0 => depth -= 1,
            ':' if depth == 0 => {
                header_end = Some(i);
                break;
            }
            _ => {}
        }
    }
    let Some(header_end) = header_end else {
        return code.to_string();
    };
    let header = &code[..=header_end];
    let body = &code[header_end + 1..];

    let mut lines = body.lines().skip_while(|l| l.trim().is_empty()).peekable();
    let Some(first) = lines.peek().copied() else {
        return format!("{header} ...");
    };
    // one-line body: `def f(): return 1`
    if !body.starts_with('\n') && !body.starts_with("\r\n") {
        return format!("{header} ...");
    }
    let indent: String = first.chars().take_while(|c| c.is_whitespace()).collect();

    let mut out = header.to_string();
    if let Some(quote) = PY_DOCSTRING.captures(first).and_then(|c| c.get(1)).map(|m| m.as_str()) {
        let mut closed = false;
        for (n, line) in lines.by_ref().enumerate() {
            out.push('\n');
            out.push_str(line);
            let trimmed = line.trim_start();
            let search_from = if n == 0 { trimmed.find(quote).map(|p| p + 3).unwrap_or(0) } else { 0 };
            if trimmed[search_from.min(trimmed.len())..].contains(quote) {
                closed = true;
                break;
            }
        }
        if !closed {
            return code.to_string();
        }
    }
    out.push('\n');
    out.push_str(&indent);
    out.push_str("...");
    out
}

fn related_trailer(language: Language, related: &[CodeGraphNode]) -> Option<String> {
    let files: BTreeSet<String> = related
        .iter()
        .filter_map(|n| n.location.path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    if files.is_empty() {
        return None;
    }
    Some(format!(
        "{} related: {}",
        language.line_comment(),
        files.into_iter().collect::<Vec<_>>().join(", ")
    ))
}

#[async_trait::async_trait]
impl SkeletonGenerator for LocalGenerator {
    async fn skeletonize_code_graph_node(
        &self,
        file_path: &Path,
        node: &CodeGraphNode,
        code_block: &str,
        _documents: &DocumentCache,
        related_nodes: &[CodeGraphNode],
    ) -> Result<SkeletonizedNode> {
        let language = Language::from_path(file_path);
        let mut skeleton = Self::condense(language, node, code_block);
        if let Some(trailer) = related_trailer(language, related_nodes) {
            skeleton.push('\n');
            skeleton.push_str(&trailer);
        }
        Ok(SkeletonizedNode {
            node: node.clone(),
            skeleton,
        })
    }

    fn name(&self) -> &str {
        "Local (Heuristic)"
    }
}
