//! Greedy word-wrap chunking used ahead of summarization.
//!
//! Summarization backends accept a bounded amount of input, so extracted text is wrapped at a
//! fixed character width and each wrapped line becomes one chunk:
//!
//! - Breaks are only placed at whitespace, never inside a word. A single word wider than the
//!   limit is emitted as its own oversized chunk; the summarizer may truncate or reject it.
//! - Chunks borrow from the source text. Whitespace inside a chunk is kept as-is, so joining the
//!   chunks with the separators that were dropped between them reproduces the input.
//! - Width is counted in `char`s, not bytes.

use super::types::ChunkingError;

/// Split `text` into chunks of at most `max_chunk_chars` characters.
///
/// Returns an empty vector for empty or whitespace-only text.
pub fn chunk_text(text: &str, max_chunk_chars: usize) -> Result<Vec<&str>, ChunkingError> {
    Ok(chunks(text, max_chunk_chars)?.collect())
}

/// Lazily wrap `text` into chunks. See [`chunk_text`].
pub fn chunks(text: &str, max_chunk_chars: usize) -> Result<Chunks<'_>, ChunkingError> {
    if max_chunk_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    Ok(Chunks {
        rest: text,
        max_chunk_chars,
    })
}

/// Iterator over word-wrapped chunks of a borrowed string.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chunk_chars: usize,
}

impl<'a> Chunks<'a> {
    fn emit(&mut self, text: &'a str, end: usize) -> &'a str {
        let (chunk, rest) = text.split_at(end);
        self.rest = rest;
        chunk
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.rest.trim_start();
        if text.is_empty() {
            self.rest = "";
            return None;
        }

        // `end` is the byte offset just past the last word accepted into this chunk.
        let mut end = 0;
        let mut width = 0;
        let mut in_word = false;

        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if in_word {
                    if end > 0 && width > self.max_chunk_chars {
                        return Some(self.emit(text, end));
                    }
                    end = idx;
                    in_word = false;
                }
            } else {
                in_word = true;
            }
            width += 1;
        }

        if in_word {
            if end > 0 && width > self.max_chunk_chars {
                return Some(self.emit(text, end));
            }
            end = text.len();
        }

        Some(self.emit(text, end))
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
