// Embedding pipeline module
// Chunking plus the provider boundary used to turn chunk text into vectors

pub mod chunking;
pub mod ollama;

use anyhow::Result;
use async_trait::async_trait;

/// Default output dimension of `nomic-embed-text`
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;

/// An order-preserving batch embedding backend.
///
/// `embed` must return exactly one vector per input text, in input order.
/// A failed call carries no partial results.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g. `"nomic-embed-text:latest"`)
    fn model_name(&self) -> &str;

    /// Output vector dimensionality
    fn dimension(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
