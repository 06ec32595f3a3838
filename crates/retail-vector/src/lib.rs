//! On-disk semantic index over the knowledge corpus (LanceDB).
//!
//! A collection is rebuilt wholesale: the old table directory is removed and
//! every chunk is re-embedded and inserted in fixed-size batches. There is no
//! incremental upsert. Queries embed the text with the same embedder and
//! return the nearest chunks by cosine distance.
//!
//! `rebuild` takes `&mut self` and queries take `&self`, so a shared handle
//! can never be queried while it is being rebuilt.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use std::path::{Path, PathBuf};

use retail_core::config::Settings;
use retail_core::data_processor::{ChunkingConfig, DataProcessor};
use retail_core::traits::Embedder;
use retail_core::types::{DocumentChunk, SearchHit};

pub const DEFAULT_BATCH_SIZE: usize = 100;

pub struct VectorIndex {
    db_dir: PathBuf,
    collection: String,
    batch_size: usize,
    embedder: Box<dyn Embedder>,
    processor: DataProcessor,
}

impl VectorIndex {
    pub fn new(db_dir: impl Into<PathBuf>, collection: &str, embedder: Box<dyn Embedder>) -> Self {
        Self {
            db_dir: db_dir.into(),
            collection: collection.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            embedder,
            processor: DataProcessor::new(),
        }
    }

    /// Index handle configured from `settings`, with the embedder it selects.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = retail_embed::get_default_embedder(&settings.index)?;
        let ix = &settings.index;
        Self::new(settings.data.index_dir(), &ix.collection, embedder)
            .with_batch_size(ix.batch_size)
            .with_chunking(&ChunkingConfig { chunk_size: ix.chunk_size, chunk_overlap: ix.chunk_overlap })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_chunking(mut self, config: &ChunkingConfig) -> Result<Self> {
        self.processor = DataProcessor::with_config(config)?;
        Ok(self)
    }

    pub fn collection(&self) -> &str { &self.collection }

    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    fn collection_path(&self) -> PathBuf {
        self.db_dir.join(format!("{}.lance", self.collection))
    }

    /// The collection is on disk. Deleting it forces a rebuild on next use.
    pub fn exists(&self) -> bool {
        self.collection_path().is_dir()
    }

    /// Load, chunk and index `corpus_dir`, replacing the collection.
    ///
    /// Returns the number of chunks written. When no document can be loaded
    /// the existing collection is left untouched and 0 is returned.
    pub async fn build(&mut self, corpus_dir: &Path) -> Result<usize> {
        tracing::info!("building index '{}' from {}", self.collection, corpus_dir.display());
        let chunks = self.processor.process_directory(corpus_dir)?;
        if chunks.is_empty() {
            tracing::warn!("no documents loaded from {}; index left as is", corpus_dir.display());
            return Ok(0);
        }
        self.rebuild(&chunks).await
    }

    /// Build only if the collection is absent. Returns whether a build ran.
    pub async fn ensure_built(&mut self, corpus_dir: &Path) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.build(corpus_dir).await?;
        Ok(true)
    }

    /// Drop the collection and insert `chunks` from scratch.
    pub async fn rebuild(&mut self, chunks: &[DocumentChunk]) -> Result<usize> {
        std::fs::create_dir_all(&self.db_dir)
            .with_context(|| format!("create index dir {}", self.db_dir.display()))?;
        let path = self.collection_path();
        if path.exists() {
            std::fs::remove_dir_all(&path).with_context(|| format!("remove {}", path.display()))?;
            tracing::info!("dropped collection '{}'", self.collection);
        }

        let conn = table::open_db(&self.db_dir).await?;
        if let Err(e) = self.write_collection(&conn, chunks).await {
            // A half-written collection must read as absent so the next
            // `ensure_built` starts over.
            if path.exists() {
                if let Err(rm) = std::fs::remove_dir_all(&path) {
                    tracing::warn!("could not remove partial collection {}: {}", path.display(), rm);
                }
            }
            return Err(e);
        }

        table::set_meta(&conn, &self.collection, "embedder_id", self.embedder.model_id()).await?;
        table::set_meta(&conn, &self.collection, "metric", "cosine").await?;
        table::set_meta(&conn, &self.collection, "chunk_count", &chunks.len().to_string()).await?;
        tracing::info!("index '{}' built with {} chunks", self.collection, chunks.len());
        Ok(chunks.len())
    }

    async fn write_collection(&self, conn: &lancedb::Connection, chunks: &[DocumentChunk]) -> Result<()> {
        let dim = self.embedder.dim();
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for (n, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            let record_batch = writer::chunks_to_record_batch(batch, &vectors, dim)?;
            writer::insert_batch(conn, &self.collection, record_batch).await?;
            pb.inc(batch.len() as u64);
            tracing::debug!("inserted batch {} ({} chunks)", n + 1, batch.len());
        }
        pb.finish_with_message("done");
        Ok(())
    }

    /// Top-`k` chunks for `query`, most similar first.
    ///
    /// A missing collection yields an empty list.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if !self.exists() {
            tracing::warn!("collection '{}' not built; no context retrieved", self.collection);
            return Ok(Vec::new());
        }
        let conn = table::open_db(&self.db_dir).await?;
        if !table::has_table(&conn, &self.collection).await? {
            tracing::warn!("collection '{}' not found in {}", self.collection, self.db_dir.display());
            return Ok(Vec::new());
        }
        if let Some(built_with) = table::get_meta(&conn, &self.collection, "embedder_id").await? {
            if built_with != self.embedder.model_id() {
                tracing::warn!(
                    "collection '{}' was built with {} but queried with {}; relevance will suffer",
                    self.collection,
                    built_with,
                    self.embedder.model_id()
                );
            }
        }

        let query_vec = self.embedder.embed_one(query)?;
        let tbl = conn.open_table(&self.collection).execute().await?;
        let mut stream = tbl
            .vector_search(query_vec)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await?;

        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            hits.extend(search::hits_from_batch(&batch)?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    /// Raw text of the top-`k` chunks. Any failure degrades to an empty list.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        match self.search(query, k).await {
            Ok(hits) => hits.into_iter().map(|h| h.content).collect(),
            Err(e) => {
                tracing::warn!("retrieval failed: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Stored meta value for this collection.
    pub async fn meta(&self, key: &str) -> Result<Option<String>> {
        if !self.db_dir.exists() {
            return Ok(None);
        }
        let conn = table::open_db(&self.db_dir).await?;
        table::get_meta(&conn, &self.collection, key).await
    }
}
