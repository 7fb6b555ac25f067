//! The skeleton-generator capability and its configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thicket_core::{CodeGraphNode, DocumentCache, SkeletonizedNode};

/// Produces the condensed text for one node.
#[async_trait::async_trait]
pub trait SkeletonGenerator: Send + Sync {
    /// `code_block` is the node's source with completed children already
    /// folded in. `related_nodes` are the nodes it imports from.
    async fn skeletonize_code_graph_node(
        &self,
        file_path: &Path,
        node: &CodeGraphNode,
        code_block: &str,
        documents: &DocumentCache,
        related_nodes: &[CodeGraphNode],
    ) -> Result<SkeletonizedNode>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// `[generator]` table of `thicket.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// `local` or `openai`
    pub provider: String,
    pub model: String,
    /// OpenAI-compatible endpoint root, e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Skeleton cache lifetime; 0 disables the cache
    pub cache_ttl_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            cache_ttl_secs: 3600,
        }
    }
}
