//! Persistable documents and workspace-relative graph projections

use std::collections::BTreeSet;
use thicket_core::{
    CodeGraph, DocumentMetadata, EdgeMap, IndexDocument, NodeId, SkeletonizedNode, SymbolTable, Workspace,
};

/// Edge maps and symbol table in the form committed to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelativeGraph {
    pub import_edges: EdgeMap,
    pub export_edges: EdgeMap,
    pub symbol_table: SymbolTable,
}

pub fn relative_graph(workspace: &Workspace, graph: &CodeGraph) -> RelativeGraph {
    let projected = graph.projected(|id| workspace.relative_id(id), |p| workspace.relative_path_buf(p));
    RelativeGraph {
        import_edges: projected.import_edges().clone(),
        export_edges: projected.export_edges().clone(),
        symbol_table: projected.symbol_table().clone(),
    }
}

fn relative_file(workspace: &Workspace, id: &NodeId) -> String {
    let path = std::path::Path::new(id.path());
    workspace
        .relative_path(path)
        .unwrap_or_else(|| id.path().to_string())
}

/// One document per skeletonized node, ids and paths made workspace-relative.
pub fn build_documents(workspace: &Workspace, skeletons: &[SkeletonizedNode], graph: &CodeGraph) -> Vec<IndexDocument> {
    skeletons
        .iter()
        .map(|skeleton| {
            let node = &skeleton.node;
            let related_files: BTreeSet<String> = graph
                .get_import_edge(&node.id)
                .into_iter()
                .flatten()
                .map(|target| relative_file(workspace, target))
                .collect();
            IndexDocument {
                id: workspace.relative_id(&node.id).to_string(),
                content: skeleton.skeleton.clone(),
                metadata: DocumentMetadata {
                    file_path: workspace.relative_path_buf(&node.location.path).to_string_lossy().into_owned(),
                    start: node.location.range.start,
                    end: node.location.range.end,
                    related_files: related_files.into_iter().collect(),
                    parent_id: node.parent_node_id.as_ref().map(|p| workspace.relative_id(p).to_string()),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_core::{CodeGraphNode, FileEntry, Location, NodeKind, Position, Range};

    fn node(path: &str, kind: NodeKind, lines: (u32, u32), parent: Option<&CodeGraphNode>) -> CodeGraphNode {
        CodeGraphNode::new(
            kind,
            "n",
            Location::new(path, Range::new(Position::new(lines.0, 0), Position::new(lines.1, 0))),
            parent.map(|p| p.id.clone()),
        )
    }

    #[test]
    fn documents_are_workspace_relative() {
        let workspace = Workspace::new("/ws");
        let a = node("/ws/src/a.ts", NodeKind::File, (0, 9), None);
        let f = node("/ws/src/a.ts", NodeKind::Function, (2, 4), Some(&a));
        let b = node("/ws/src/b.ts", NodeKind::File, (0, 3), None);

        let mut graph = CodeGraph::new();
        graph.update_file_with_edges(
            "src/a.ts",
            FileEntry::new(BTreeSet::from([a.id.clone(), f.id.clone()]), "sha"),
            vec![a.clone(), f.clone(), b.clone()],
            EdgeMap::from([(a.id.clone(), BTreeSet::from([b.id.clone()]))]),
            EdgeMap::from([(b.id.clone(), BTreeSet::from([a.id.clone()]))]),
        );

        let skeletons = vec![
            SkeletonizedNode { node: f.clone(), skeleton: "function f() { ... }".to_string() },
            SkeletonizedNode { node: a.clone(), skeleton: "function f() { ... }".to_string() },
        ];
        let documents = build_documents(&workspace, &skeletons, &graph);
        insta::assert_json_snapshot!(documents, @r#"
        [
          {
            "id": "src/a.ts:2:0-4:0",
            "content": "function f() { ... }",
            "metadata": {
              "filePath": "src/a.ts",
              "start": {
                "line": 2,
                "character": 0
              },
              "end": {
                "line": 4,
                "character": 0
              },
              "relatedFiles": [],
              "parentId": "src/a.ts:0:0-9:0"
            }
          },
          {
            "id": "src/a.ts:0:0-9:0",
            "content": "function f() { ... }",
            "metadata": {
              "filePath": "src/a.ts",
              "start": {
                "line": 0,
                "character": 0
              },
              "end": {
                "line": 9,
                "character": 0
              },
              "relatedFiles": [
                "src/b.ts"
              ],
              "parentId": null
            }
          }
        ]
        "#);

        let relative = relative_graph(&workspace, &graph);
        assert_eq!(
            relative.import_edges,
            EdgeMap::from([(
                NodeId("src/a.ts:0:0-9:0".to_string()),
                BTreeSet::from([NodeId("src/b.ts:0:0-3:0".to_string())])
            )])
        );
        assert!(relative.symbol_table.get("src/a.ts").unwrap().node_ids.contains(&NodeId("src/a.ts:2:0-4:0".to_string())));
    }
}
