use super::*;

#[test]
fn empty_content_produces_no_chunks() {
    assert!(chunk_text("", DEFAULT_MAX_CHUNK_CHARS).is_empty());
}

#[test]
fn short_content_is_a_single_chunk() {
    let chunks = chunk_text("Revenue was $100M this quarter.", DEFAULT_MAX_CHUNK_CHARS);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Revenue was $100M this quarter.");
    assert_eq!(chunks[0].chunk_index, 0);
}

#[test]
fn exact_boundary_is_a_single_chunk() {
    let content = "x".repeat(DEFAULT_MAX_CHUNK_CHARS);
    let chunks = chunk_text(&content, DEFAULT_MAX_CHUNK_CHARS);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text.chars().count(), DEFAULT_MAX_CHUNK_CHARS);
}

#[test]
fn one_past_boundary_splits_into_two() {
    let content = "x".repeat(DEFAULT_MAX_CHUNK_CHARS + 1);
    let chunks = chunk_text(&content, DEFAULT_MAX_CHUNK_CHARS);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text.chars().count(), DEFAULT_MAX_CHUNK_CHARS);
    assert_eq!(chunks[1].text.chars().count(), 1);
}

#[test]
fn chunk_count_is_ceiling_of_length() {
    for char_count in [1, 499, 500, 501, 999, 1000, 1001, 1250, 2503] {
        let content = "a".repeat(char_count);
        let chunks = chunk_text(&content, DEFAULT_MAX_CHUNK_CHARS);
        let expected = char_count.div_ceil(DEFAULT_MAX_CHUNK_CHARS);
        assert_eq!(
            chunks.len(),
            expected,
            "wrong chunk count for {char_count} characters"
        );
    }
}

#[test]
fn chunks_are_indexed_sequentially() {
    let content = "b".repeat(1700);
    let chunks = chunk_text(&content, DEFAULT_MAX_CHUNK_CHARS);

    for (expected_index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, expected_index);
    }
}

#[test]
fn concatenation_reproduces_content() {
    let content = "The quick brown fox jumps over the lazy dog. ".repeat(40);
    let chunks = chunk_text(&content, 100);

    let reassembled: String = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(reassembled, content);
}

#[test]
fn splits_on_character_boundaries() {
    // Multibyte characters must never be split mid-codepoint
    let content = "日本語のテキスト".repeat(100);
    let chunks = chunk_text(&content, 13);

    let reassembled: String = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(reassembled, content);

    for chunk in &chunks {
        assert!(chunk.text.chars().count() <= 13);
    }
}

#[test]
fn custom_chunk_size() {
    let content = "abcdefghij";
    let chunks = chunk_text(content, 4);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].text, "abcd");
    assert_eq!(chunks[1].text, "efgh");
    assert_eq!(chunks[2].text, "ij");
}

#[test]
fn zero_max_chars_yields_nothing() {
    assert!(chunk_text("anything", 0).is_empty());
}
