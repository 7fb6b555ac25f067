//! Unit tests for thicket-parser

use crate::*;
use std::collections::BTreeSet;
use thicket_core::test_utils::create_repo_with_structure;
use thicket_core::{CodeGraphNode, NodeKind, TextDocument};

async fn parse(root: &std::path::Path, rel: &str) -> ParsedDocument {
    let path = root.join(rel);
    let text = std::fs::read_to_string(&path).unwrap();
    let parser = TreeSitterParser::new(ParserPool::new(2), root);
    parser
        .create_nodes_from_document(&TextDocument::new(path, text))
        .await
        .unwrap()
}

fn named<'a>(result: &'a ParsedDocument, kind: NodeKind, name: &str) -> &'a CodeGraphNode {
    result
        .nodes
        .iter()
        .find(|n| n.kind == kind && n.name == name)
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

#[tokio::test]
async fn test_rust_extraction() {
    let repo = create_repo_with_structure(&[(
        "test.rs",
        r#"fn main() {
    println!("Hello, world!");
}

fn helper() -> i32 {
    42
}

struct User {
    name: String,
}

impl User {
    fn new(name: String) -> Self {
        User { name }
    }
}
"#,
    )]);
    let result = parse(repo.path(), "test.rs").await;

    let file = named(&result, NodeKind::File, "test.rs");
    let main = named(&result, NodeKind::Function, "main");
    let imp = named(&result, NodeKind::Impl, "User");
    let new = named(&result, NodeKind::Method, "new");
    named(&result, NodeKind::Function, "helper");
    named(&result, NodeKind::Struct, "User");

    assert_eq!(result.nodes.len(), 6);
    assert_eq!(main.parent_node_id.as_ref(), Some(&file.id));
    assert_eq!(new.parent_node_id.as_ref(), Some(&imp.id));
    assert!(file.parent_node_id.is_none());
    assert!(result.import_edges.is_empty());
}

#[tokio::test]
async fn test_javascript_extraction() {
    let repo = create_repo_with_structure(&[(
        "test.js",
        r#"function greet(name) {
    return "Hello, " + name;
}

class Person {
    constructor(name) {
        this.name = name;
    }

    greet() {
        return "Hello, I'm " + this.name;
    }
}

const arrowFunc = () => {
    return 42;
};
"#,
    )]);
    let result = parse(repo.path(), "test.js").await;

    let person = named(&result, NodeKind::Class, "Person");
    let ctor = named(&result, NodeKind::Method, "constructor");
    let method = named(&result, NodeKind::Method, "greet");
    named(&result, NodeKind::Function, "greet");
    named(&result, NodeKind::Function, "arrowFunc");

    assert_eq!(ctor.parent_node_id.as_ref(), Some(&person.id));
    assert_eq!(method.parent_node_id.as_ref(), Some(&person.id));
}

#[tokio::test]
async fn test_python_extraction() {
    let repo = create_repo_with_structure(&[(
        "test.py",
        r#"def greet(name):
    return f"Hello, {name}"

class Person:
    def __init__(self, name):
        self.name = name

    def greet(self):
        return f"Hello, I'm {self.name}"
"#,
    )]);
    let result = parse(repo.path(), "test.py").await;

    let person = named(&result, NodeKind::Class, "Person");
    named(&result, NodeKind::Function, "greet");
    let init = named(&result, NodeKind::Method, "__init__");
    assert_eq!(init.parent_node_id.as_ref(), Some(&person.id));

    let methods = result.nodes.iter().filter(|n| n.kind == NodeKind::Method).count();
    assert_eq!(methods, 2);
}

#[tokio::test]
async fn test_node_ids_derive_from_location() {
    let repo = create_repo_with_structure(&[("a.rs", "fn a() {}\n")]);
    let result = parse(repo.path(), "a.rs").await;
    let path = repo.path().join("a.rs");

    let file = named(&result, NodeKind::File, "a.rs");
    let a = named(&result, NodeKind::Function, "a");
    assert_eq!(file.id.as_str(), format!("{}:0:0-1:0", path.display()));
    assert_eq!(a.id.as_str(), format!("{}:0:0-0:9", path.display()));
}

#[tokio::test]
async fn test_import_edges_point_at_foreign_file_node() {
    let repo = create_repo_with_structure(&[
        (
            "src/index.ts",
            "import { UserService } from './services/user';\nimport React from 'react';\n\nexport function main() {\n    return new UserService();\n}\n",
        ),
        (
            "src/services/user.ts",
            "export class UserService {\n    loadUsers() {\n        return [];\n    }\n}\n",
        ),
    ]);
    let root = repo.path();
    let index = parse(root, "src/index.ts").await;
    let user = parse(root, "src/services/user.ts").await;

    let index_file = named(&index, NodeKind::File, "index.ts");
    let foreign = named(&index, NodeKind::File, "user.ts");
    let user_file = named(&user, NodeKind::File, "user.ts");

    // same id whether seen as an import or parsed directly
    assert_eq!(foreign.id, user_file.id);
    assert!(foreign.is_in(&root.join("src/services/user.ts")));
    assert_eq!(
        index.import_edges.get(&index_file.id),
        Some(&BTreeSet::from([foreign.id.clone()]))
    );
    assert_eq!(
        index.export_edges.get(&foreign.id),
        Some(&BTreeSet::from([index_file.id.clone()]))
    );
    // `react` is a package, not a workspace file
    assert_eq!(index.import_edges.len(), 1);
}

#[tokio::test]
async fn test_import_inside_definition_is_keyed_by_it() {
    let repo = create_repo_with_structure(&[
        ("app/main.py", "def run():\n    from app.util import helper\n    return helper()\n"),
        ("app/util.py", "def helper():\n    return 42\n"),
    ]);
    let result = parse(repo.path(), "app/main.py").await;

    let run = named(&result, NodeKind::Function, "run");
    let util = named(&result, NodeKind::File, "util.py");
    assert_eq!(result.import_edges.get(&run.id), Some(&BTreeSet::from([util.id.clone()])));
}

#[tokio::test]
async fn test_rust_mod_declarations_create_edges() {
    let repo = create_repo_with_structure(&[
        ("src/lib.rs", "mod utils;\n\npub fn add(a: i32) -> i32 {\n    utils::double(a)\n}\n"),
        ("src/utils.rs", "pub fn double(x: i32) -> i32 {\n    x * 2\n}\n"),
    ]);
    let result = parse(repo.path(), "src/lib.rs").await;

    let lib = named(&result, NodeKind::File, "lib.rs");
    let utils = named(&result, NodeKind::File, "utils.rs");
    assert_eq!(result.import_edges.get(&lib.id), Some(&BTreeSet::from([utils.id.clone()])));
}

#[tokio::test]
async fn test_empty_and_unsupported_documents() {
    let parser = TreeSitterParser::with_default_pool("/ws");

    let empty = parser
        .create_nodes_from_document(&TextDocument::new("/ws/empty.rs", ""))
        .await
        .unwrap();
    assert!(empty.is_empty());

    let markdown = parser
        .create_nodes_from_document(&TextDocument::new("/ws/README.md", "# Title\n"))
        .await
        .unwrap();
    assert!(markdown.is_empty());
}

#[tokio::test]
async fn test_binary_content_is_an_encoding_error() {
    let parser = TreeSitterParser::with_default_pool("/ws");
    let result = parser
        .create_nodes_from_document(&TextDocument::new("/ws/blob.rs", "fn a() {}\0\0"))
        .await;
    assert!(matches!(result, Err(ParseError::Encoding { .. })));
}
