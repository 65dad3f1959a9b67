#[cfg(test)]
mod tests;

use tracing::debug;

/// Default maximum chunk length in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 500;

/// A slice of section content ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The literal text slice
    pub text: String,
    /// Position of this chunk within the section's content
    pub chunk_index: usize,
}

/// Split content into consecutive chunks of at most `max_chars` characters.
///
/// Chunks are sequential and non-overlapping: concatenating them reproduces
/// the input, the final chunk may be shorter, and empty content yields no
/// chunks. The chunk count is therefore `ceil(char_count / max_chars)`.
#[inline]
pub fn chunk_text(content: &str, max_chars: usize) -> Vec<ContentChunk> {
    if content.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for ch in content.chars() {
        current.push(ch);
        current_chars += 1;

        if current_chars == max_chars {
            chunks.push(ContentChunk {
                text: std::mem::take(&mut current),
                chunk_index: chunks.len(),
            });
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(ContentChunk {
            text: current,
            chunk_index: chunks.len(),
        });
    }

    debug!(
        "Chunked {} characters into {} chunks (max {})",
        content.chars().count(),
        chunks.len(),
        max_chars
    );

    chunks
}
