//! Corpus loading and chunking.
//!
//! Reads the `.pdf` and `.txt` files sitting directly in the corpus directory,
//! splits each with [`Splitter`] and hands back [`DocumentChunk`]s in a
//! deterministic order (sorted paths, then position in the document).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;
use crate::splitter::{Splitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::types::DocumentChunk;

/// Built-in documents written to an empty corpus directory on first run.
pub const SAMPLE_DOCUMENTS: [(&str, &str); 3] = [
    ("menu.txt", include_str!("samples/menu.txt")),
    ("store_policies.txt", include_str!("samples/store_policies.txt")),
    ("refund_faqs.txt", include_str!("samples/refund_faqs.txt")),
];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocKind {
    Pdf,
    Text,
}

#[derive(Default)]
pub struct DataProcessor {
    splitter: Splitter,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    /// Fails with `Error::InvalidConfig` on an unusable size/overlap pair.
    pub fn with_config(config: &ChunkingConfig) -> crate::error::Result<Self> {
        Ok(Self { splitter: Splitter::new(config.chunk_size, config.chunk_overlap)? })
    }

    /// Create `dir` if needed and seed it with [`SAMPLE_DOCUMENTS`] when it
    /// holds no supported files. Returns the files to load.
    pub fn ensure_corpus(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).with_context(|| format!("create corpus dir {}", dir.display()))?;
        let files = list_documents(dir);
        if !files.is_empty() {
            return Ok(files);
        }
        tracing::warn!("no .pdf or .txt files in {}; writing sample documents", dir.display());
        write_sample_corpus(dir)?;
        Ok(list_documents(dir))
    }

    /// Load and chunk every document in `dir`, seeding samples first if empty.
    ///
    /// A file that fails to load is logged and skipped. An empty result means
    /// nothing could be loaded.
    pub fn process_directory(&self, dir: &Path) -> Result<Vec<DocumentChunk>> {
        let files = self.ensure_corpus(dir)?;
        let mut all_chunks = Vec::new();
        let mut loaded = 0usize;
        for (file_index, path) in files.iter().enumerate() {
            tracing::debug!("processing file {}/{}: {}", file_index + 1, files.len(), path.display());
            match self.process_file(path) {
                Ok(chunks) => {
                    tracing::info!("loaded {} ({} chunks)", file_name(path), chunks.len());
                    loaded += 1;
                    all_chunks.extend(chunks);
                }
                Err(e) => tracing::warn!("error loading {}: {:#}", file_name(path), e),
            }
        }
        tracing::info!("processed {} of {} files into {} chunks", loaded, files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    /// Chunk one document. PDFs are split per page before chunking.
    pub fn process_file(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        let pages = match doc_kind(path) {
            Some(DocKind::Pdf) => extract_pdf_text(path)?
                .split('\u{c}')
                .map(str::to_string)
                .collect::<Vec<_>>(),
            Some(DocKind::Text) => vec![read_text(path)?],
            None => return Err(Error::Operation(format!("unsupported file type: {}", path.display())).into()),
        };

        let doc_id = doc_id(path);
        let doc_path = path.to_string_lossy().to_string();
        let pieces: Vec<String> = pages.iter().flat_map(|p| self.splitter.split(p)).collect();
        let total_chunks = pieces.len();
        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: format!("{doc_id}:{chunk_index}"),
                doc_id: doc_id.clone(),
                doc_path: doc_path.clone(),
                content,
                chunk_index,
                total_chunks,
            })
            .collect())
    }
}

/// Write the built-in sample documents into `dir`.
pub fn write_sample_corpus(dir: &Path) -> Result<()> {
    for (name, content) in SAMPLE_DOCUMENTS {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created sample document: {}", name);
    }
    Ok(())
}

/// Supported files directly under `dir`, sorted.
fn list_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| doc_kind(p).is_some())
        .collect();
    files.sort();
    files
}

fn doc_kind(path: &Path) -> Option<DocKind> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("pdf") => Some(DocKind::Pdf),
        Some("txt") => Some(DocKind::Text),
        _ => None,
    }
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

/// Text of a PDF via the `pdftotext` binary (poppler). Pages are separated by
/// form feeds.
fn extract_pdf_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .context("pdftotext command failed (is poppler installed?)")?;
    if !output.status.success() {
        return Err(Error::Operation(format!(
            "pdftotext failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }
    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        return Err(Error::Operation("pdftotext produced no text output".into()).into());
    }
    Ok(text)
}

fn doc_id(path: &Path) -> String {
    path.file_stem().map_or_else(|| "unknown".to_string(), |s| s.to_string_lossy().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().to_string())
}
