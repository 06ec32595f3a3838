//! Character-sized, boundary-aware chunking on top of `text-splitter`.
//!
//! Chunks prefer the highest semantic boundary that fits (paragraph, line,
//! sentence, word, then grapheme), hold at most `chunk_size` characters, and
//! start with up to `chunk_overlap` characters of the previous chunk. Output
//! is whitespace-trimmed and never empty.

use text_splitter::{Characters, ChunkConfig, TextSplitter};

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

pub struct Splitter {
    inner: TextSplitter<Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Splitter {
    /// Fails when `chunk_size` is 0 or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".into()));
        }
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| Error::InvalidConfig(format!("chunking: {e}")))?;
        Ok(Self { inner: TextSplitter::new(config), chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn chunk_overlap(&self) -> usize { self.chunk_overlap }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.inner.chunks(text).map(str::to_string).collect()
    }
}

impl Default for Splitter {
    fn default() -> Self {
        let config = ChunkConfig::new(DEFAULT_CHUNK_SIZE)
            .with_overlap(DEFAULT_CHUNK_OVERLAP)
            .unwrap_or_else(|_| ChunkConfig::new(DEFAULT_CHUNK_SIZE));
        Self {
            inner: TextSplitter::new(config),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
