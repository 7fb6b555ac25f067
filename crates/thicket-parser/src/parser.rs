//! The code-parser capability and child-skeleton merging

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thicket_core::{CodeGraphNode, EdgeMap, NodeId, Range, SkeletonizedNode, TextDocument, offset_within};

/// Nodes and edges extracted from one document.
///
/// `nodes` may contain file nodes of other documents that this one imports;
/// their location points at the foreign file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub nodes: Vec<CodeGraphNode>,
    pub import_edges: EdgeMap,
    pub export_edges: EdgeMap,
}

impl ParsedDocument {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no grammar for {0}")]
    Unsupported(PathBuf),
    #[error("{path} is not valid source text: {reason}")]
    Encoding { path: PathBuf, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Syntax { path: PathBuf, reason: String },
    #[error("parser pool unavailable: {0}")]
    Pool(String),
}

/// Turns a document into graph nodes and edges.
#[async_trait]
pub trait CodeParser: Send + Sync {
    /// Extract the document's nodes and the import/export edges it takes part in.
    ///
    /// Unsupported or empty documents yield an empty [`ParsedDocument`].
    async fn create_nodes_from_document(&self, document: &TextDocument) -> Result<ParsedDocument, ParseError>;

    /// Replace each completed child's span in `raw_text` with its skeleton.
    fn merge_code_node_summaries_into_parent(
        &self,
        parent_range: &Range,
        raw_text: &str,
        child_ids: &[NodeId],
        completed: &HashMap<NodeId, SkeletonizedNode>,
    ) -> String {
        merge_child_skeletons(parent_range, raw_text, child_ids, completed)
    }
}

/// Splice child skeletons into the parent text, last child first so earlier
/// offsets stay valid. Overlapping or out-of-range children are skipped.
pub fn merge_child_skeletons(
    parent_range: &Range,
    raw_text: &str,
    child_ids: &[NodeId],
    completed: &HashMap<NodeId, SkeletonizedNode>,
) -> String {
    let mut children: Vec<&SkeletonizedNode> = child_ids.iter().filter_map(|id| completed.get(id)).collect();
    children.sort_by(|a, b| b.node.location.range.start.cmp(&a.node.location.range.start));

    let mut merged = raw_text.to_string();
    let mut floor = raw_text.len();
    for child in children {
        let range = child.node.location.range;
        let start = offset_within(raw_text, parent_range.start, range.start);
        let end = offset_within(raw_text, parent_range.start, range.end);
        match (start, end) {
            (Some(start), Some(end)) if start <= end && end <= floor => {
                merged.replace_range(start..end, &child.skeleton);
                floor = start;
            }
            _ => tracing::warn!("Skipping child {} outside parent span", child.node.id),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_core::{Location, NodeKind, Position};

    fn skeleton(range: Range, text: &str) -> SkeletonizedNode {
        SkeletonizedNode {
            node: CodeGraphNode::new(NodeKind::Method, "m", Location::new("/ws/a.ts", range), None),
            skeleton: text.to_string(),
        }
    }

    #[test]
    fn merges_children_in_reverse_order() {
        let parent_text = "class A {\n    f() { return 1; }\n    g() { return 2; }\n}";
        let parent_range = Range::new(Position::new(4, 0), Position::new(7, 1));
        let f = skeleton(Range::new(Position::new(5, 4), Position::new(5, 21)), "f() { ... }");
        let g = skeleton(Range::new(Position::new(6, 4), Position::new(6, 21)), "g() { ... }");
        let completed = HashMap::from([(f.node.id.clone(), f.clone()), (g.node.id.clone(), g.clone())]);

        let merged = merge_child_skeletons(
            &parent_range,
            parent_text,
            &[f.node.id.clone(), g.node.id.clone()],
            &completed,
        );
        insta::assert_snapshot!(merged, @r"
        class A {
            f() { ... }
            g() { ... }
        }
        ");
    }

    #[test]
    fn missing_and_overlapping_children_are_ignored() {
        let parent_text = "fn a() {\n    inner();\n}";
        let parent_range = Range::new(Position::new(0, 0), Position::new(2, 1));
        let outer = skeleton(Range::new(Position::new(0, 0), Position::new(2, 1)), "fn a() { ... }");
        let inner = skeleton(Range::new(Position::new(1, 4), Position::new(1, 11)), "X");
        let completed = HashMap::from([
            (outer.node.id.clone(), outer.clone()),
            (inner.node.id.clone(), inner.clone()),
        ]);

        let merged = merge_child_skeletons(
            &parent_range,
            parent_text,
            &[outer.node.id.clone(), inner.node.id.clone(), NodeId("unknown".into())],
            &completed,
        );
        // inner is applied first (later start); outer then overlaps and is skipped
        assert_eq!(merged, "fn a() {\n    X;\n}");
    }

    #[test]
    fn child_columns_past_their_line_are_skipped() {
        let parent_text = "class A {\n    f() {}\n    g() {}\n}";
        let parent_range = Range::new(Position::new(0, 0), Position::new(3, 1));
        // column 14 on line 1 would otherwise land inside `g`
        let bad = skeleton(Range::new(Position::new(1, 4), Position::new(1, 14)), "f() { ... }");
        let completed = HashMap::from([(bad.node.id.clone(), bad.clone())]);

        let merged = merge_child_skeletons(&parent_range, parent_text, &[bad.node.id.clone()], &completed);
        assert_eq!(merged, parent_text);
    }
}
