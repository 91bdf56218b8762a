//! Overlapping text chunker for embedding long content.
//!
//! Text is scanned in windows of `size` characters. Before cutting, the
//! window is searched backward for the last sentence terminator, then the
//! last line break; a boundary found past the window start becomes the cut.
//! The next window starts `overlap` characters before the cut, but always at
//! least one character after the previous start, so degenerate overlaps
//! still terminate.
//!
//! Positions are counted in characters, never bytes, so multi-byte text is
//! never split inside a code point.

use std::ops::Range;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split `text` into trimmed, overlapping chunks of at most `size` characters.
///
/// Text no longer than `size` yields a single chunk equal to the trimmed
/// input. Whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    chunk_spans(text, size, overlap)
        .into_iter()
        .map(|span| text[span].trim())
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Byte ranges of each chunk in `text`, before trimming.
///
/// Range starts are strictly increasing and together the ranges cover every
/// byte of the input.
pub fn chunk_spans(text: &str, size: usize, overlap: usize) -> Vec<Range<usize>> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    // offsets[i] is the byte offset of character i; offsets[len] == text.len().
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());

    if len <= size {
        return vec![0..text.len()];
    }

    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + size).min(len);

        if end < len {
            if let Some(cut) = find_boundary(&chars[start..end]) {
                end = start + cut;
            }
        }

        spans.push(offsets[start]..offsets[end]);

        if end >= len {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    spans
}

/// Position just past the last sentence terminator (or, failing that, the
/// last line break) in `window`, if it lies past the window start.
fn find_boundary(window: &[char]) -> Option<usize> {
    let last_sentence = window
        .iter()
        .rposition(|c| SENTENCE_TERMINATORS.contains(c));
    let boundary = last_sentence.or_else(|| window.iter().rposition(|c| *c == '\n'))?;

    if boundary > 0 { Some(boundary + 1) } else { None }
}
