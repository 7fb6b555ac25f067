//! Skeleton generation for Thicket
//!
//! Turns code graph nodes into condensed skeletons, either with a local
//! heuristic or through an OpenAI-compatible model.

pub mod bridge;
pub mod cache;
pub mod prompt;
pub mod providers;


pub use bridge::*;
pub use cache::{CacheStats, CachedGenerator, SkeletonCache};
pub use providers::create_generator;
pub use providers::local::LocalGenerator;
pub use providers::openai::{OpenAIGenerator, strip_code_fence};
