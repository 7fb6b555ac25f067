//! Bottom-up skeleton composition for the nodes of one file

use crate::error::{IndexError, Result};
use futures_util::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thicket_ai::SkeletonGenerator;
use thicket_core::{CodeGraph, CodeGraphNode, DocumentCache, NodeId, SkeletonizedNode, TextDocument};
use thicket_parser::CodeParser;

/// Turns nodes into skeletons, children before parents.
pub struct Skeletonizer {
    parser: Arc<dyn CodeParser>,
    generator: Arc<dyn SkeletonGenerator>,
}

/// Nodes of one call, indexed by position, with parent links resolved.
struct Arena<'a> {
    nodes: &'a [CodeGraphNode],
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl<'a> Arena<'a> {
    fn new(nodes: &'a [CodeGraphNode]) -> Self {
        let index: HashMap<&NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();
        let linked: Vec<Option<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                n.parent_node_id
                    .as_ref()
                    .and_then(|p| index.get(p).copied())
                    .filter(|&p| p != i)
            })
            .collect();

        // keep a link only if following it ends at a root
        let parent: Vec<Option<usize>> = (0..nodes.len())
            .map(|i| {
                let mut seen = HashSet::from([i]);
                let mut current = i;
                while let Some(p) = linked[current] {
                    if !seen.insert(p) {
                        tracing::debug!("Parent chain of {} cycles, treating it as a root", nodes[i].id);
                        return None;
                    }
                    current = p;
                }
                linked[i]
            })
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        for (i, p) in parent.iter().enumerate() {
            if let Some(p) = p {
                children[*p].push(i);
            }
        }
        Self {
            nodes,
            parent,
            children,
        }
    }

    fn depth(&self, mut i: usize) -> usize {
        let mut depth = 0;
        while let Some(p) = self.parent[i] {
            depth += 1;
            i = p;
        }
        depth
    }

    /// Node indices grouped by depth, deepest bucket first.
    fn buckets(&self) -> Vec<Vec<usize>> {
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        for i in 0..self.nodes.len() {
            let depth = self.depth(i);
            if buckets.len() <= depth {
                buckets.resize_with(depth + 1, Vec::new);
            }
            buckets[depth].push(i);
        }
        buckets.reverse();
        buckets
    }
}

impl Skeletonizer {
    pub fn new(parser: Arc<dyn CodeParser>, generator: Arc<dyn SkeletonGenerator>) -> Self {
        Self { parser, generator }
    }

    /// Skeletonize `nodes`, all located in `document`.
    ///
    /// The result lists every child before its parent. One failed generation
    /// fails the whole call.
    pub async fn skeletonize(
        &self,
        document: TextDocument,
        nodes: &[CodeGraphNode],
        graph: &CodeGraph,
    ) -> Result<Vec<SkeletonizedNode>> {
        let file_path = document.path.clone();
        let documents = DocumentCache::new();
        documents.insert(document);

        let arena = Arena::new(nodes);
        let mut completed: HashMap<NodeId, SkeletonizedNode> = HashMap::with_capacity(nodes.len());
        let mut ordered = Vec::with_capacity(nodes.len());

        for bucket in arena.buckets() {
            let done = &completed;
            let tasks = bucket.into_iter().map(|i| {
                let node = &arena.nodes[i];
                let child_ids: Vec<NodeId> = arena.children[i].iter().map(|&c| arena.nodes[c].id.clone()).collect();
                let documents = &documents;
                let file_path = &file_path;
                async move {
                    let document = documents
                        .get_or_load(&node.location.path)
                        .await
                        .map_err(|source| IndexError::DocumentUnavailable {
                            path: node.location.path.clone(),
                            source,
                        })?;
                    let raw = document.text_in_range(&node.location.range);
                    let code_block = if child_ids.is_empty() {
                        raw.to_string()
                    } else {
                        self.parser
                            .merge_code_node_summaries_into_parent(&node.location.range, raw, &child_ids, done)
                    };
                    let related = graph.related_nodes(&node.id);
                    self.generator
                        .skeletonize_code_graph_node(file_path, node, &code_block, documents, &related)
                        .await
                        .map_err(|source| IndexError::Generation {
                            node: node.id.to_string(),
                            source,
                        })
                }
            });
            let generated = try_join_all(tasks).await?;
            for skeleton in generated {
                completed.insert(skeleton.id().clone(), skeleton.clone());
                ordered.push(skeleton);
            }
        }

        tracing::debug!("Skeletonized {} nodes of {}", ordered.len(), file_path.display());
        Ok(ordered)
    }
}
