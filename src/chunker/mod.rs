
use std::collections::VecDeque;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Configuration for adaptive chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self { chunk_size: 1500 }
    }
}

impl ChunkingConfig {
    /// Hard ceiling before a paragraph is force-split
    #[inline]
    pub fn max_chunk_size(&self) -> usize {
        self.chunk_size * 2
    }
}

/// A bounded unit of body text produced by the chunker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text, a contiguous slice of the source
    pub text: String,
    /// Ordered position within the document
    pub index: usize,
    /// Length in characters, including internal separators
    pub char_len: usize,
    /// Byte span of this chunk within the source text
    pub span: Range<usize>,
}

/// Split cleaned text into a lazy, ordered sequence of chunks.
///
/// Chunks accumulate whole paragraphs (separated by blank lines) up to the
/// target size and never exceed twice the target. A single paragraph longer
/// than the ceiling falls back to accumulation of single lines, so boundaries
/// always land on paragraph or line breaks, never mid-line. The sequence is
/// one-pass: empty input yields an empty sequence.
#[inline]
pub fn chunk_text<'a>(text: &'a str, config: &ChunkingConfig) -> Chunks<'a> {
    Chunks {
        text,
        config: *config,
        cursor: 0,
        peeked: None,
        pending: VecDeque::new(),
        next_index: 0,
    }
}

/// Lazy chunk iterator over one document's text
#[derive(Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    config: ChunkingConfig,
    /// Byte position of the next unconsumed paragraph
    cursor: usize,
    /// One-slot lookahead for a paragraph pulled but not yet used
    peeked: Option<Range<usize>>,
    /// Line spans remaining from a force-split oversized paragraph
    pending: VecDeque<Range<usize>>,
    next_index: usize,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            if !self.pending.is_empty() {
                return Some(self.build_from_lines());
            }

            let paragraph = self.take_paragraph()?;
            if char_len(self.text, &paragraph) > self.config.max_chunk_size() {
                self.explode_paragraph(paragraph);
                // Re-enter in fallback mode
                continue;
            }
            return Some(self.build_from_paragraphs(paragraph));
        }
    }
}

impl Chunks<'_> {
    /// Next paragraph span at or after the cursor, skipping blank-line runs
    fn take_paragraph(&mut self) -> Option<Range<usize>> {
        if let Some(span) = self.peeked.take() {
            return Some(span);
        }

        let bytes = self.text.as_bytes();
        let mut start = self.cursor;
        while start < bytes.len() && bytes[start] == b'\n' {
            start += 1;
        }
        if start >= bytes.len() {
            self.cursor = bytes.len();
            return None;
        }

        let end = self.text.get(start..).and_then(|rest| {
            rest.find("\n\n").map(|offset| start + offset)
        });
        let end = end.unwrap_or(self.text.len());
        self.cursor = end;
        Some(start..end)
    }

    /// Accumulate whole paragraphs up to the target size
    fn build_from_paragraphs(&mut self, first: Range<usize>) -> Chunk {
        let mut span = first.clone();
        let mut len = char_len(self.text, &first);

        while len < self.config.chunk_size {
            let Some(next) = self.take_paragraph() else {
                break;
            };
            let next_len = char_len(self.text, &next);
            if next_len > self.config.max_chunk_size() {
                // Oversized paragraph starts its own fallback sequence
                self.peeked = Some(next);
                break;
            }
            let separator = next.start - span.end;
            if len + separator + next_len > self.config.chunk_size {
                self.peeked = Some(next);
                break;
            }
            span.end = next.end;
            len += separator + next_len;
        }

        self.finish_chunk(span, len)
    }

    /// Accumulate single lines from a force-split paragraph
    fn build_from_lines(&mut self) -> Chunk {
        let mut span = self
            .pending
            .pop_front()
            .unwrap_or_else(|| self.cursor..self.cursor);
        let mut len = char_len(self.text, &span);

        while len < self.config.chunk_size {
            let Some(next) = self.pending.front() else {
                break;
            };
            let next_len = char_len(self.text, next);
            let separator = next.start - span.end;
            if len + separator + next_len > self.config.chunk_size {
                break;
            }
            span.end = next.end;
            len += separator + next_len;
            self.pending.pop_front();
        }

        self.finish_chunk(span, len)
    }

    /// Queue an oversized paragraph's line spans for fallback accumulation
    fn explode_paragraph(&mut self, paragraph: Range<usize>) {
        let mut line_start = paragraph.start;
        let body = self.text.get(paragraph.clone()).unwrap_or_default();
        for line in body.split_inclusive('\n') {
            let content_len = line.trim_end_matches('\n').len();
            if content_len > 0 {
                self.pending
                    .push_back(line_start..line_start + content_len);
            }
            line_start += line.len();
        }
    }

    fn finish_chunk(&mut self, span: Range<usize>, len: usize) -> Chunk {
        let chunk = Chunk {
            text: self.text.get(span.clone()).unwrap_or_default().to_string(),
            index: self.next_index,
            char_len: len,
            span,
        };
        self.next_index += 1;
        chunk
    }
}

fn char_len(text: &str, span: &Range<usize>) -> usize {
    text.get(span.clone())
        .map_or(0, |slice| slice.chars().count())
}
