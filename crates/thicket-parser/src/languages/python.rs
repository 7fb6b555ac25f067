//! Python language extractor using tree-sitter

use super::{LanguageExtractor, existing_in, field_text};
use std::path::{Path, PathBuf};
use thicket_core::NodeKind;
use tree_sitter::Node;

pub struct PythonExtractor;

impl PythonExtractor {
    /// Module names bound by `import a.b` / `import a.b as c`.
    fn imported_modules(node: Node, source: &[u8]) -> Vec<String> {
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .filter_map(|child| Self::dotted(child, source))
            .collect()
    }

    /// `from m import a, b` yields `m.a` and `m.b`; resolution falls back to `m`.
    fn from_imports(node: Node, source: &[u8]) -> Vec<String> {
        let Some(module) = field_text(node, "module_name", source) else {
            return Vec::new();
        };
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|child| Self::dotted(child, source))
            .collect();
        if names.is_empty() {
            return vec![module.to_string()];
        }
        names
            .into_iter()
            .map(|name| {
                if module.ends_with('.') {
                    format!("{module}{name}")
                } else {
                    format!("{module}.{name}")
                }
            })
            .collect()
    }

    fn dotted(node: Node, source: &[u8]) -> Option<String> {
        let target = if node.kind() == "aliased_import" {
            node.child_by_field_name("name")?
        } else {
            node
        };
        target.utf8_text(source).ok().map(str::to_string)
    }

    /// `a/b.py` or `a/b/__init__.py` under `base`.
    fn module_file(base: &Path, parts: &[&str], root: &Path) -> Option<PathBuf> {
        let (last, dirs) = parts.split_last()?;
        let dir = dirs.iter().fold(base.to_path_buf(), |acc, p| acc.join(p));
        existing_in(dir.join(format!("{last}.py")), root)
            .or_else(|| existing_in(dir.join(format!("{last}.pyi")), root))
            .or_else(|| existing_in(dir.join(last).join("__init__.py"), root))
    }

    /// Longest prefix of `parts` that names a module file under `base`.
    fn longest_module(base: &Path, parts: &[&str], root: &Path) -> Option<PathBuf> {
        (1..=parts.len())
            .rev()
            .find_map(|n| Self::module_file(base, &parts[..n], root))
    }
}

impl LanguageExtractor for PythonExtractor {
    fn definition(&self, node: Node, source: &[u8], enclosing: Option<NodeKind>) -> Option<(NodeKind, String)> {
        let kind = match node.kind() {
            "function_definition" if enclosing == Some(NodeKind::Class) => NodeKind::Method,
            "function_definition" => NodeKind::Function,
            "class_definition" => NodeKind::Class,
            _ => return None,
        };
        let name = field_text(node, "name", source)?;
        Some((kind, name.to_string()))
    }

    fn import_specifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        match node.kind() {
            "import_statement" => Self::imported_modules(node, source),
            "import_from_statement" => Self::from_imports(node, source),
            _ => Vec::new(),
        }
    }

    fn resolve_import(&self, importer: &Path, specifier: &str, root: &Path) -> Option<PathBuf> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        let rest = &specifier[dots..];
        let parts: Vec<&str> = rest.split('.').filter(|s| !s.is_empty()).collect();

        if dots > 0 {
            let mut base = importer.parent()?.to_path_buf();
            for _ in 1..dots {
                base = base.parent()?.to_path_buf();
            }
            if parts.is_empty() {
                return existing_in(base.join("__init__.py"), root);
            }
            return Self::longest_module(&base, &parts, root);
        }

        if parts.is_empty() {
            return None;
        }
        Self::longest_module(root, &parts, root)
            .or_else(|| Self::longest_module(importer.parent()?, &parts, root))
    }
}
