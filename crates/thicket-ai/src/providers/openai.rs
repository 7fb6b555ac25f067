//! OpenAI-compatible chat-completions generator (OpenAI, OpenRouter, local servers)

use crate::bridge::{GeneratorConfig, SkeletonGenerator};
use crate::prompt::{SKELETON_SYSTEM_PROMPT, related_snippets, skeleton_prompt};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thicket_core::{CodeGraphNode, DocumentCache, SkeletonizedNode};

pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Build from configuration, reading the API key from `api_key_env`.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} is not set", config.api_key_env))?;
        Ok(Self::with_api_key(config, api_key))
    }

    pub fn with_api_key(config: &GeneratorConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

/// Drop a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim_end()
}

#[async_trait::async_trait]
impl SkeletonGenerator for OpenAIGenerator {
    async fn skeletonize_code_graph_node(
        &self,
        file_path: &Path,
        node: &CodeGraphNode,
        code_block: &str,
        documents: &DocumentCache,
        related_nodes: &[CodeGraphNode],
    ) -> Result<SkeletonizedNode> {
        let related = related_snippets(related_nodes, documents).await;
        let prompt = skeleton_prompt(file_path, node, code_block, &related);

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: SKELETON_SYSTEM_PROMPT.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the generator endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Generator API error ({}): {}", status, error_text);
        }

        let text = response.text().await.context("Failed to read generator response")?;
        let body: OpenAIResponse = serde_json::from_str(&text)
            .with_context(|| format!("Malformed generator response: {}", text.chars().take(200).collect::<String>()))?;
        let choice = body
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("Generator returned no choices for {}", node.id))?;
        if let Some(usage) = &body.usage {
            tracing::debug!("Skeleton for {} used {} tokens", node.id, usage.total_tokens);
        }

        Ok(SkeletonizedNode {
            node: node.clone(),
            skeleton: strip_code_fence(&choice.message.content).to_string(),
        })
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
