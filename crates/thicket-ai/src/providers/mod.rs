//! Skeleton generator implementations

pub mod local;
pub mod openai;

use crate::bridge::{GeneratorConfig, SkeletonGenerator};
use crate::cache::CachedGenerator;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Factory function to create a generator, wrapped in the skeleton cache
/// unless `cache_ttl_secs` is 0.
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn SkeletonGenerator>> {
    let generator: Box<dyn SkeletonGenerator> = match config.provider.as_str() {
        "local" => Box::new(local::LocalGenerator::new()),
        "openai" => Box::new(openai::OpenAIGenerator::new(config)?),
        other => anyhow::bail!("Unknown generator provider: {}", other),
    };
    tracing::debug!("Using {} generator", generator.name());

    if config.cache_ttl_secs == 0 {
        return Ok(Arc::from(generator));
    }
    Ok(Arc::new(CachedGenerator::new(
        generator,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}
