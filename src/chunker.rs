use crate::models::chunk::TextChunk;

/// Split `text` into fixed-size character windows overlapping by `overlap`.
///
/// The text is trimmed first; blank input yields no chunks. Each window is at
/// most `chunk_size` characters and starts `chunk_size - overlap` characters
/// after the previous one (at least one). The last window may be shorter and
/// no empty trailing window is produced.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }

    let chunk_size = chunk_size.max(1);
    let step = chunk_size.saturating_sub(overlap).max(1);

    // Byte offset of every char boundary, so windows never split a code point.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = boundaries.len();
    boundaries.push(text.len());

    let mut chunks = Vec::with_capacity(char_count / step + 1);
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(TextChunk {
            content: text[boundaries[start]..boundaries[end]].to_string(),
            order: chunks.len(),
        });
        if end == char_count {
            break;
        }
        start += step;
    }
    chunks
}
