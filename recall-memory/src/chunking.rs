//! Overlapping word-window chunking

use crate::config::ChunkingConfig;
use crate::error::Result;

/// A word-window slice of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence number within the document
    pub index: usize,
    /// Offset of the first word
    pub start_word: usize,
    /// Words of the window joined by single spaces
    pub text: String,
}

/// Split `text` into windows of `size` words starting every `size - overlap` words
///
/// Windows start at `0, S-O, 2(S-O), ...` for every offset below the word count,
/// so the tail may produce short windows fully contained in the previous one.
pub fn chunk_words(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = config.stride();

    let chunks = (0..words.len())
        .step_by(stride)
        .enumerate()
        .map(|(index, start)| {
            let end = (start + config.size).min(words.len());
            Chunk {
                index,
                start_word: start,
                text: words[start..end].join(" "),
            }
        })
        .collect();

    Ok(chunks)
}
