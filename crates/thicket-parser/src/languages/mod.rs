//! Language extractors: definition classification, import discovery and resolution

pub mod python;
pub mod rust;
pub mod typescript;

use crate::parser_pool::FileType;
use std::path::{Path, PathBuf};
use thicket_core::{NodeKind, Position, Range};
use tree_sitter::{Node, Point, Tree};

/// Per-language knowledge the tree walker needs.
pub trait LanguageExtractor: Send + Sync {
    /// Classify a syntax node as a definition, returning its kind and name.
    ///
    /// `enclosing` is the kind of the nearest enclosing definition, if any.
    fn definition(&self, node: Node, source: &[u8], enclosing: Option<NodeKind>) -> Option<(NodeKind, String)>;

    /// Import specifiers declared by this syntax node. Non-empty means the
    /// walker does not descend into it.
    fn import_specifiers(&self, node: Node, source: &[u8]) -> Vec<String>;

    /// Resolve a specifier to an existing file inside `root`.
    fn resolve_import(&self, importer: &Path, specifier: &str, root: &Path) -> Option<PathBuf>;
}

/// Get the extractor for a file type
pub fn get_extractor(file_type: FileType) -> &'static dyn LanguageExtractor {
    match file_type {
        FileType::Rust => &rust::RustExtractor,
        FileType::TypeScript | FileType::Tsx | FileType::JavaScript => &typescript::ScriptExtractor,
        FileType::Python => &python::PythonExtractor,
    }
}

/// A definition found in the tree. `parent` indexes into the same list.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: NodeKind,
    pub name: String,
    pub range: Range,
    pub parent: Option<usize>,
}

/// An import statement and the definition it sits in.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSite {
    pub specifier: String,
    pub enclosing: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub definitions: Vec<Definition>,
    pub imports: Vec<ImportSite>,
}

/// Walk the tree in document order with an explicit stack.
pub fn extract(extractor: &dyn LanguageExtractor, tree: &Tree, source: &str) -> Extraction {
    let bytes = source.as_bytes();
    let mut out = Extraction::default();
    let mut stack: Vec<(Node, Option<usize>)> = vec![(tree.root_node(), None)];

    while let Some((node, enclosing)) = stack.pop() {
        let specifiers = extractor.import_specifiers(node, bytes);
        if !specifiers.is_empty() {
            out.imports.extend(specifiers.into_iter().map(|specifier| ImportSite { specifier, enclosing }));
            continue;
        }

        let mut scope = enclosing;
        let enclosing_kind = enclosing.map(|i| out.definitions[i].kind);
        if let Some((kind, name)) = extractor.definition(node, bytes, enclosing_kind) {
            out.definitions.push(Definition {
                kind,
                name,
                range: node_range(node),
                parent: enclosing,
            });
            scope = Some(out.definitions.len() - 1);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, scope)));
    }

    out
}

pub fn point_to_position(point: Point) -> Position {
    Position::new(point.row as u32, point.column as u32)
}

pub fn node_range(node: Node) -> Range {
    Range::new(point_to_position(node.start_position()), point_to_position(node.end_position()))
}

/// Text of a named field, if present and valid UTF-8.
pub fn field_text<'a>(node: Node, field: &str, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field)?.utf8_text(source).ok()
}

/// Keep `candidate` only when it is an existing file under `root`.
pub(crate) fn existing_in(candidate: PathBuf, root: &Path) -> Option<PathBuf> {
    let candidate = thicket_core::workspace::normalize(&candidate);
    (candidate.starts_with(root) && candidate.is_file()).then_some(candidate)
}
