//! TypeScript / JavaScript extractor using tree-sitter

use super::{LanguageExtractor, existing_in, field_text};
use std::path::{Path, PathBuf};
use thicket_core::NodeKind;
use tree_sitter::Node;

/// Shared by the TypeScript, TSX and JavaScript grammars, which agree on the
/// node kinds used here.
pub struct ScriptExtractor;

const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

impl ScriptExtractor {
    fn string_literal(node: Node, source: &[u8]) -> Option<String> {
        let text = node.utf8_text(source).ok()?;
        let trimmed = text.trim_matches(|c| c == '"' || c == '\'' || c == '`');
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// `const f = () => {}` and `const f = function () {}`.
    fn function_binding(node: Node, source: &[u8]) -> Option<String> {
        let value = node.child_by_field_name("value")?;
        match value.kind() {
            "arrow_function" | "function_expression" | "function" => {
                field_text(node, "name", source).map(str::to_string)
            }
            _ => None,
        }
    }

    /// `require('./x')` calls.
    fn require_call(node: Node, source: &[u8]) -> Option<String> {
        if field_text(node, "function", source)? != "require" {
            return None;
        }
        let args = node.child_by_field_name("arguments")?;
        let first = args.named_child(0)?;
        if first.kind() != "string" {
            return None;
        }
        Self::string_literal(first, source)
    }
}

impl LanguageExtractor for ScriptExtractor {
    fn definition(&self, node: Node, source: &[u8], _enclosing: Option<NodeKind>) -> Option<(NodeKind, String)> {
        let kind = match node.kind() {
            "function_declaration" | "generator_function_declaration" => NodeKind::Function,
            "method_definition" | "abstract_method_signature" => NodeKind::Method,
            "class_declaration" | "abstract_class_declaration" => NodeKind::Class,
            "interface_declaration" => NodeKind::Interface,
            "enum_declaration" => NodeKind::Enum,
            "type_alias_declaration" => NodeKind::TypeAlias,
            "internal_module" | "module" => NodeKind::Module,
            "variable_declarator" => {
                return Self::function_binding(node, source).map(|name| (NodeKind::Function, name));
            }
            _ => return None,
        };
        let name = field_text(node, "name", source)?;
        Some((kind, name.to_string()))
    }

    fn import_specifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        let specifier = match node.kind() {
            "import_statement" | "export_statement" => node
                .child_by_field_name("source")
                .and_then(|s| Self::string_literal(s, source)),
            "call_expression" => Self::require_call(node, source),
            _ => None,
        };
        specifier.into_iter().collect()
    }

    fn resolve_import(&self, importer: &Path, specifier: &str, root: &Path) -> Option<PathBuf> {
        // bare specifiers are packages
        if !specifier.starts_with('.') {
            return None;
        }
        let base = importer.parent()?.join(specifier);
        if let Some(found) = existing_in(base.clone(), root) {
            return Some(found);
        }

        // `./x.js` written in TypeScript sources refers to `./x.ts`
        let stripped = match base.extension().and_then(|e| e.to_str()) {
            Some(ext) if EXTENSIONS.contains(&ext) => base.with_extension(""),
            _ => base.clone(),
        };
        let with_extension = stripped.file_name().and_then(|n| n.to_str()).and_then(|name| {
            EXTENSIONS
                .iter()
                .find_map(|ext| existing_in(stripped.with_file_name(format!("{name}.{ext}")), root))
        });
        with_extension.or_else(|| {
            EXTENSIONS
                .iter()
                .find_map(|ext| existing_in(base.join(format!("index.{ext}")), root))
        })
    }
}
