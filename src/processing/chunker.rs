//! Chunker — greedy bin-packing of normalized texts, then a global size cap.
//!
//! A text is never split: one longer than `chunk_size` becomes its own chunk.
//! The cap drops the oldest chunks, so what survives is a chronological suffix.

use crate::constants::{char_len, CHUNK_SEPARATOR};

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Length of `text` in chars, separators included.
    pub len: usize,
    pub message_count: usize,
}

impl Chunk {
    fn start(text: &str) -> Self {
        Self {
            text: text.to_string(),
            len: char_len(text),
            message_count: 1,
        }
    }

    fn append(&mut self, text: &str, text_len: usize) {
        self.text.push_str(CHUNK_SEPARATOR);
        self.text.push_str(text);
        self.len += CHUNK_SEPARATOR.len() + text_len;
        self.message_count += 1;
    }
}

pub fn total_len(chunks: &[Chunk]) -> usize {
    chunks.iter().map(|c| c.len).sum()
}

pub struct Chunker;

impl Chunker {
    pub fn partition<S: AsRef<str>>(texts: &[S], chunk_size: usize) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Option<Chunk> = None;

        for text in texts {
            let text: &str = text.as_ref();
            if text.is_empty() {
                continue;
            }
            let text_len = char_len(text);

            current = match current.take() {
                None => Some(Chunk::start(text)),
                Some(mut chunk) => {
                    if chunk.len + CHUNK_SEPARATOR.len() + text_len > chunk_size {
                        chunks.push(chunk);
                        Some(Chunk::start(text))
                    } else {
                        chunk.append(text, text_len);
                        Some(chunk)
                    }
                }
            };
        }

        if let Some(chunk) = current {
            chunks.push(chunk);
        }

        tracing::debug!(chunks = chunks.len(), chunk_size, "Texts partitioned");
        chunks
    }

    pub fn enforce_cap(chunks: Vec<Chunk>, max_chars: usize) -> Vec<Chunk> {
        let total = total_len(&chunks);
        if total <= max_chars {
            return chunks;
        }

        let mut kept_total = 0usize;
        let mut keep_from = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate().rev() {
            if kept_total + chunk.len > max_chars {
                break;
            }
            kept_total += chunk.len;
            keep_from = idx;
        }

        let dropped = keep_from;
        let kept: Vec<Chunk> = chunks.into_iter().skip(keep_from).collect();
        tracing::warn!(
            dropped,
            kept = kept.len(),
            kept_chars = kept_total,
            original_chars = total,
            max_chars,
            "Input over cap, oldest chunks dropped"
        );
        kept
    }
}
