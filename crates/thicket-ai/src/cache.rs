//! Skeleton cache for avoiding redundant generator calls

use crate::bridge::SkeletonGenerator;
use anyhow::Result;
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thicket_core::{CodeGraphNode, DocumentCache, NodeId, SkeletonizedNode, content_digest};

/// Cache entry with expiration
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub skeleton: SkeletonizedNode,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.timestamp.elapsed() > self.ttl
    }
}

/// Key for cache lookups
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct CacheKey {
    node_id: NodeId,
    input_digest: String,
}

impl CacheKey {
    fn new(node: &CodeGraphNode, code_block: &str, related_nodes: &[CodeGraphNode]) -> Self {
        let mut input = String::with_capacity(code_block.len() + related_nodes.len() * 32);
        input.push_str(code_block);
        for related in related_nodes {
            input.push('\0');
            input.push_str(related.id.as_str());
        }
        Self {
            node_id: node.id.clone(),
            input_digest: content_digest(&input),
        }
    }
}

/// Skeletons keyed by node id and a digest of the generator input
pub struct SkeletonCache {
    entries: DashMap<CacheKey, CacheEntry>,
    default_ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SkeletonCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Get cached skeleton if available and not expired
    pub fn get(&self, node: &CodeGraphNode, code_block: &str, related_nodes: &[CodeGraphNode]) -> Option<SkeletonizedNode> {
        let key = CacheKey::new(node, code_block, related_nodes);
        let found = self
            .entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.skeleton.clone());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a skeleton in cache
    pub fn insert(&self, code_block: &str, related_nodes: &[CodeGraphNode], skeleton: SkeletonizedNode) {
        let key = CacheKey::new(&skeleton.node, code_block, related_nodes);
        let entry = CacheEntry {
            skeleton,
            timestamp: Instant::now(),
            ttl: self.default_ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Clear expired entries
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            expired_entries: self.entries.iter().filter(|e| e.is_expired()).count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Wraps a generator so unchanged input is never sent twice.
pub struct CachedGenerator {
    inner: Box<dyn SkeletonGenerator>,
    cache: SkeletonCache,
}

impl CachedGenerator {
    pub fn new(inner: Box<dyn SkeletonGenerator>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SkeletonCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &SkeletonCache {
        &self.cache
    }
}

#[async_trait::async_trait]
impl SkeletonGenerator for CachedGenerator {
    async fn skeletonize_code_graph_node(
        &self,
        file_path: &Path,
        node: &CodeGraphNode,
        code_block: &str,
        documents: &DocumentCache,
        related_nodes: &[CodeGraphNode],
    ) -> Result<SkeletonizedNode> {
        if let Some(hit) = self.cache.get(node, code_block, related_nodes) {
            tracing::trace!("Skeleton cache hit for {}", node.id);
            return Ok(hit);
        }
        let skeleton = self
            .inner
            .skeletonize_code_graph_node(file_path, node, code_block, documents, related_nodes)
            .await?;
        self.cache.insert(code_block, related_nodes, skeleton.clone());
        Ok(skeleton)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
