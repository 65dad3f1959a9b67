// LanceDB vector database module
// Handles chunk embedding storage and similarity search


pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{ChunkMatch, VectorStore};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding (768 dimensions for nomic-embed-text)
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// ID of the section that owns this chunk
    pub section_id: String,
    /// Position of this chunk within the section's content
    pub chunk_index: u32,
    /// The literal text slice of the chunk
    pub text: String,
    /// Timestamp when this embedding was created
    pub created_at: String,
}
