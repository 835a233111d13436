//! Sliding-window text chunking.
//!
//! [`TextChunker`] cuts text into windows of `chunk_size` characters that
//! advance by `chunk_size - chunk_overlap`, so neighbouring chunks share
//! exactly `chunk_overlap` characters. The last window may be shorter.
//!
//! ```ignore
//! let chunker = TextChunker::new(500, 100)?;
//! let pieces: Vec<&str> = chunker.split(&text).collect();
//! ```

use crate::types::{AppError, Chunk, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker. Requires `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::Validation("chunk size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Lazily split `text` into overlapping windows.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            size: self.chunk_size,
            step: self.step(),
            start: 0,
            start_char: 0,
            finished: text.is_empty(),
        }
    }

    /// Number of chunks [`split`](Self::split) yields for a text of `len` characters.
    pub fn expected_count(&self, len: usize) -> usize {
        match len {
            0 => 0,
            n if n <= self.chunk_overlap => 1,
            n => (n - self.chunk_overlap).div_ceil(self.step()),
        }
    }

    /// Split every page of a document into [`Chunk`]s numbered across the whole document.
    pub fn chunk_document(&self, document_id: &str, pages: &[String]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for (page, text) in pages.iter().enumerate() {
            for (source_offset, piece) in self.split(text).with_offsets() {
                chunks.push(Chunk {
                    text: piece.to_string(),
                    source_offset,
                    page,
                    document_id: document_id.to_string(),
                    sequence_index: chunks.len(),
                });
            }
        }
        chunks
    }
}

/// Iterator over the windows of one text. Cloning restarts from the current position.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    size: usize,
    step: usize,
    /// Byte offset of the next window.
    start: usize,
    /// Character offset of the next window.
    start_char: usize,
    finished: bool,
}

impl<'a> Chunks<'a> {
    /// Pair every chunk with its character offset in the source text.
    pub fn with_offsets(self) -> WithOffsets<'a> {
        WithOffsets { inner: self }
    }

    fn next_window(&mut self) -> Option<(usize, &'a str)> {
        if self.finished {
            return None;
        }

        let rest = &self.text[self.start..];
        let end = byte_offset_of_char(rest, self.size);
        let window = &rest[..end];
        let offset = self.start_char;

        if self.start + end >= self.text.len() {
            self.finished = true;
        } else {
            self.start += byte_offset_of_char(rest, self.step);
            self.start_char += self.step;
        }

        Some((offset, window))
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_window().map(|(_, window)| window)
    }
}

pub struct WithOffsets<'a> {
    inner: Chunks<'a>,
}

impl<'a> Iterator for WithOffsets<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_window()
    }
}

/// Byte offset of the `n`th character of `s`, or `s.len()` when `s` is shorter.
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lengths(chunker: &TextChunker, text: &str) -> Vec<usize> {
        chunker.split(text).map(|c| c.chars().count()).collect()
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(10, 10).is_err());
        assert!(TextChunker::new(10, 11).is_err());
        assert!(TextChunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let chunker = TextChunker::new(500, 100).unwrap();
        assert_eq!(chunker.split("").count(), 0);
        assert!(chunker.chunk_document("a.pdf", &[String::new()]).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(500, 100).unwrap();
        let chunks: Vec<&str> = chunker.split("Refunds are processed within 30 days.").collect();
        assert_eq!(chunks, vec!["Refunds are processed within 30 days."]);
    }

    #[test]
    fn test_twelve_hundred_characters() {
        let chunker = TextChunker::new(500, 100).unwrap();
        let text: String = (0..1200).map(|i| (b'a' + (i % 26) as u8) as char).collect();

        let chunks: Vec<(usize, &str)> = chunker.split(&text).with_offsets().collect();
        let offsets: Vec<usize> = chunks.iter().map(|(o, _)| *o).collect();

        assert_eq!(offsets, vec![0, 400, 800]);
        assert_eq!(lengths(&chunker, &text), vec![500, 500, 400]);
        assert_eq!(chunks[1].1, &text[400..900]);
    }

    #[rstest]
    #[case(0, 500, 100, 0)]
    #[case(50, 500, 100, 1)]
    #[case(100, 500, 100, 1)]
    #[case(500, 500, 100, 1)]
    #[case(501, 500, 100, 2)]
    #[case(900, 500, 100, 2)]
    #[case(901, 500, 100, 3)]
    #[case(1200, 500, 100, 3)]
    #[case(10, 3, 0, 4)]
    #[case(10, 3, 2, 8)]
    fn test_chunk_count(
        #[case] len: usize,
        #[case] size: usize,
        #[case] overlap: usize,
        #[case] expected: usize,
    ) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let text = "x".repeat(len);

        assert_eq!(chunker.split(&text).count(), expected);
        assert_eq!(chunker.expected_count(len), expected);
    }

    #[rstest]
    #[case(7, 3)]
    #[case(5, 0)]
    #[case(4, 3)]
    fn test_adjacent_chunks_overlap_exactly(#[case] size: usize, #[case] overlap: usize) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let text = "The quick brown fox jumps over the lazy dog, then naps.";
        let chunks: Vec<&str> = chunker.split(text).collect();

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(size - overlap).collect();
            let head: String = pair[1].chars().take(overlap).collect();
            assert_eq!(tail, head);
            assert_eq!(pair[0].chars().count(), size);
        }

        // Coverage: stitching the non-overlapping prefixes back gives the text.
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i + 1 == chunks.len() {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().take(size - overlap));
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_split_is_idempotent_and_restartable() {
        let chunker = TextChunker::new(8, 3).unwrap();
        let text = "idempotent chunking over the same input";

        let first: Vec<&str> = chunker.split(text).collect();
        let second: Vec<&str> = chunker.split(text).collect();
        assert_eq!(first, second);

        let mut iter = chunker.split(text);
        iter.next();
        let restarted: Vec<&str> = iter.clone().collect();
        assert_eq!(restarted, iter.collect::<Vec<_>>());
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks: Vec<&str> = chunker.split("ééééé").collect();
        assert_eq!(chunks, vec!["ééé", "ééé"]);
    }

    #[test]
    fn test_chunk_document_numbers_across_pages() {
        let chunker = TextChunker::new(5, 1).unwrap();
        let pages = vec!["abcdefgh".to_string(), String::new(), "xyz".to_string()];
        let chunks = chunker.chunk_document("doc.pdf", &pages);

        let summary: Vec<(usize, usize, usize, &str)> = chunks
            .iter()
            .map(|c| (c.sequence_index, c.page, c.source_offset, c.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 0, 0, "abcde"), (1, 0, 4, "efgh"), (2, 2, 0, "xyz")]
        );
        assert!(chunks.iter().all(|c| c.document_id == "doc.pdf"));
    }
}
