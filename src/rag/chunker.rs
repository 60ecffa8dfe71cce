//! Sentence-aware text chunking.
//!
//! Text is split into sentences and greedily packed into chunks of at most
//! `chunk_size` characters. Each new chunk starts with the last `overlap`
//! characters of the previous one so that context spanning a boundary is not
//! lost. A sentence is never cut: a sentence longer than `chunk_size` becomes
//! its own oversized chunk.
//!
//! Sentence detection is a heuristic: a break follows `.`, `!` or `?` when
//! whitespace comes next. Abbreviations ("e.g. this") and quoted punctuation
//! will split where a human would not.

use regex::Regex;
use std::sync::LazyLock;

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default number of characters carried over between chunks.
pub const DEFAULT_OVERLAP: usize = 50;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence break pattern is valid"));

/// Splits text into overlapping, sentence-respecting chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk `text`. Output depends only on the text and the two parameters.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            if !current.is_empty() && char_len(&current) + char_len(sentence) > self.chunk_size {
                chunks.push(current.trim().to_string());
                current = self.seed_from(&current, sentence);
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
            }
        }

        let last = current.trim();
        if !last.is_empty() {
            chunks.push(last.to_string());
        }

        chunks
    }

    /// Start the next chunk: the tail of the closed chunk, a space, then the sentence.
    fn seed_from(&self, closed: &str, sentence: &str) -> String {
        if self.overlap == 0 {
            return sentence.to_string();
        }

        let tail = tail_chars(closed, self.overlap);
        let mut seeded = String::with_capacity(tail.len() + 1 + sentence.len());
        seeded.push_str(tail);
        seeded.push(' ');
        seeded.push_str(sentence);
        seeded
    }
}

/// Split text after `.`, `!` or `?` followed by whitespace. The whitespace is
/// dropped; empty fragments are skipped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for found in SENTENCE_BREAK.find_iter(text) {
        // The punctuation mark is a single ASCII byte and stays with its sentence.
        let end = found.start() + 1;
        if end > start {
            sentences.push(&text[start..end]);
        }
        start = found.end();
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `n` characters of `text`, or all of it when it is not longer than `n`.
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(TextChunker::default().chunk("").is_empty());
    }

    #[rstest]
    #[case("Short text.")]
    #[case("  padded but short  ")]
    #[case("No punctuation at all")]
    fn test_short_text_is_single_chunk(#[case] text: &str) {
        let chunks = TextChunker::new(50, 5).chunk(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_text_exactly_chunk_size_is_single_chunk() {
        let text = "abcde fghij.";
        let chunks = TextChunker::new(text.len(), 3).chunk(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_overlap_seeding() {
        let chunks = TextChunker::new(15, 5).chunk("Hello world. This is a test.");
        assert_eq!(chunks, vec!["Hello world.", "orld. This is a test."]);
    }

    #[test]
    fn test_overlap_longer_than_chunk_uses_whole_chunk() {
        let chunks = TextChunker::new(10, 50).chunk("One two. Three four five.");
        assert_eq!(chunks, vec!["One two.", "One two. Three four five."]);
    }

    #[test]
    fn test_zero_overlap_starts_fresh() {
        let chunks = TextChunker::new(15, 0).chunk("Hello world. This is a test.");
        assert_eq!(chunks, vec!["Hello world.", "This is a test."]);
    }

    #[test]
    fn test_sentences_are_packed_greedily() {
        let text = "Aa. Bb. Cc. Dd. Ee.";
        let chunks = TextChunker::new(10, 0).chunk(text);
        // 7 + 3 does not exceed 10, so "Cc." still joins the first chunk
        assert_eq!(chunks, vec!["Aa. Bb. Cc.", "Dd. Ee."]);
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = "This sentence is much longer than the configured chunk size.";
        let text = format!("Tiny. {} End.", long);
        let chunks = TextChunker::new(20, 0).chunk(&text);
        assert_eq!(chunks, vec!["Tiny.", long, "End."]);
    }

    #[rstest]
    #[case("One. Two! Three? Four", vec!["One.", "Two!", "Three?", "Four"])]
    #[case("Pi is 3.14 exactly. Yes.", vec!["Pi is 3.14 exactly.", "Yes."])]
    #[case("Line one.\n\nLine two.", vec!["Line one.", "Line two."])]
    #[case("Trailing space. ", vec!["Trailing space."])]
    #[case("No break.here", vec!["No break.here"])]
    fn test_split_sentences(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_sentences(text), expected);
    }

    #[test]
    fn test_lengths_are_counted_in_characters() {
        // Each sentence is 6 characters but 11 bytes.
        let text = "ééééé. ààààà. ççççç.";
        let chunks = TextChunker::new(13, 2).chunk(text);
        assert_eq!(chunks, vec!["ééééé. ààààà.", "à. ççççç."]);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Alpha beta gamma. Delta epsilon! Zeta eta theta? Iota kappa lambda. ".repeat(20);
        let chunker = TextChunker::new(80, 10);
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    #[test]
    fn test_chunks_are_bounded_and_cover_every_sentence() {
        let sentences: Vec<String> = (0..40)
            .map(|i| format!("Sentence number {} talks about topic {}.", i, i * 7))
            .collect();
        let text = sentences.join(" ");
        let chunker = TextChunker::new(120, 20);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            // +1 accounts for the space between the overlap seed and the sentence
            assert!(char_len(chunk) <= 120 + 20 + 1, "chunk too long: {:?}", chunk);
        }

        let mut search_from = 0;
        for sentence in &sentences {
            let position = chunks[search_from..]
                .iter()
                .position(|c| c.contains(sentence.as_str()))
                .unwrap_or_else(|| panic!("sentence dropped: {}", sentence));
            search_from += position;
        }
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("Hello world.", 5), "orld.");
        assert_eq!(tail_chars("abc", 5), "abc");
        assert_eq!(tail_chars("abc", 0), "");
        assert_eq!(tail_chars("añb", 2), "ñb");
    }
}
