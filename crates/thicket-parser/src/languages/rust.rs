//! Rust definitions, `mod`/`use` imports and module-path resolution

use super::{LanguageExtractor, existing_in, field_text};
use std::path::{Path, PathBuf};
use thicket_core::NodeKind;
use tree_sitter::Node;

pub struct RustExtractor;

const MOD_PREFIX: &str = "mod:";

impl LanguageExtractor for RustExtractor {
    fn definition(&self, node: Node, source: &[u8], enclosing: Option<NodeKind>) -> Option<(NodeKind, String)> {
        let kind = match node.kind() {
            "function_item" | "function_signature_item" => match enclosing {
                Some(NodeKind::Impl) | Some(NodeKind::Interface) => NodeKind::Method,
                _ => NodeKind::Function,
            },
            "struct_item" | "union_item" => NodeKind::Struct,
            "enum_item" => NodeKind::Enum,
            "trait_item" => NodeKind::Interface,
            "type_item" => NodeKind::TypeAlias,
            "mod_item" if node.child_by_field_name("body").is_some() => NodeKind::Module,
            "impl_item" => {
                let ty = field_text(node, "type", source)?;
                let name = match field_text(node, "trait", source) {
                    Some(tr) => format!("{tr} for {ty}"),
                    None => ty.to_string(),
                };
                return Some((NodeKind::Impl, name));
            }
            _ => return None,
        };
        let name = field_text(node, "name", source)?;
        Some((kind, name.to_string()))
    }

    fn import_specifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        match node.kind() {
            "mod_item" if node.child_by_field_name("body").is_none() => field_text(node, "name", source)
                .map(|name| vec![format!("{MOD_PREFIX}{name}")])
                .unwrap_or_default(),
            "use_declaration" => node
                .child_by_field_name("argument")
                .and_then(|arg| use_path(arg, source))
                .map(|path| vec![path])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn resolve_import(&self, importer: &Path, specifier: &str, root: &Path) -> Option<PathBuf> {
        if let Some(name) = specifier.strip_prefix(MOD_PREFIX) {
            let dir = module_dir(importer)?;
            return existing_in(dir.join(format!("{name}.rs")), root)
                .or_else(|| existing_in(dir.join(name).join("mod.rs"), root));
        }

        let mut segments = specifier.split("::").filter(|s| !s.is_empty());
        let base = match segments.next()? {
            "crate" => crate_root(importer, root)?,
            "self" => module_dir(importer)?,
            "super" => {
                let mut dir = module_dir(importer)?.parent()?.to_path_buf();
                let rest: Vec<&str> = segments.collect();
                let mut rest = rest.as_slice();
                while rest.first() == Some(&"super") {
                    dir = dir.parent()?.to_path_buf();
                    rest = &rest[1..];
                }
                return descend(dir.clone(), rest.iter().copied(), root).or_else(|| module_file(&dir, root));
            }
            _ => return None,
        };
        descend(base, segments, root)
    }
}

/// The path part of a `use` argument, without the braced list, alias or glob.
fn use_path(arg: Node, source: &[u8]) -> Option<String> {
    let path = match arg.kind() {
        "scoped_use_list" | "use_as_clause" => arg.child_by_field_name("path")?,
        "use_wildcard" => arg.named_child(0)?,
        _ => arg,
    };
    path.utf8_text(source).ok().map(str::to_string)
}

/// Directory holding the submodules of the module defined by `file`.
fn module_dir(file: &Path) -> Option<PathBuf> {
    let parent = file.parent()?;
    let stem = file.file_stem()?.to_str()?;
    Some(match stem {
        "mod" | "lib" | "main" => parent.to_path_buf(),
        _ => parent.join(stem),
    })
}

/// Nearest ancestor directory with a `lib.rs` or `main.rs`.
fn crate_root(importer: &Path, root: &Path) -> Option<PathBuf> {
    importer
        .ancestors()
        .skip(1)
        .take_while(|dir| dir.starts_with(root))
        .find(|dir| dir.join("lib.rs").is_file() || dir.join("main.rs").is_file())
        .map(Path::to_path_buf)
}

/// File defining the module whose directory is `dir`.
fn module_file(dir: &Path, root: &Path) -> Option<PathBuf> {
    ["mod.rs", "lib.rs", "main.rs"]
        .iter()
        .find_map(|f| existing_in(dir.join(f), root))
        .or_else(|| existing_in(dir.with_extension("rs"), root))
}

/// Deepest existing module file reachable by following `segments` from `dir`.
fn descend<'a>(mut dir: PathBuf, segments: impl Iterator<Item = &'a str>, root: &Path) -> Option<PathBuf> {
    let mut best = None;
    for segment in segments {
        if let Some(file) = existing_in(dir.join(format!("{segment}.rs")), root) {
            best = Some(file);
        } else if let Some(file) = existing_in(dir.join(segment).join("mod.rs"), root) {
            best = Some(file);
        } else {
            break;
        }
        dir = dir.join(segment);
    }
    best
}
