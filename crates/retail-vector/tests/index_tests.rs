use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use retail_embed::{Embedder, FakeEmbedder, MINILM_DIM};
use retail_vector::VectorIndex;

fn index_in(dir: &std::path::Path) -> VectorIndex {
    VectorIndex::new(dir.join("index"), "retail_knowledge", Box::new(FakeEmbedder::new(MINILM_DIM)))
}

#[tokio::test]
async fn retrieve_before_build_is_empty() {
    let tmp = TempDir::new().unwrap();
    let index = index_in(tmp.path());

    assert!(!index.exists());
    assert!(index.retrieve("refund policy", 4).await.is_empty());
    assert!(index.search("refund policy", 4).await.unwrap().is_empty());
}

#[tokio::test]
async fn build_then_retrieve_sample_corpus() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("pdfs");
    let mut index = index_in(tmp.path()).with_batch_size(2);

    let written = index.build(&corpus).await.expect("build");
    // menu, store_policies and refund_faqs; the menu fits in one chunk.
    assert!(written >= 5, "written: {written}");
    assert!(index.exists());

    let hits = index.search("What is your refund policy?", 4).await.expect("search");
    assert_eq!(hits.len(), 4);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits[0].content.contains("refund"), "top hit: {}", hits[0].content);
    assert!(hits[0].source.ends_with("refund_faqs.txt"));

    let texts = index.retrieve("What is your refund policy?", 2).await;
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], hits[0].content);

    assert_eq!(index.meta("chunk_count").await.unwrap().as_deref(), Some(written.to_string().as_str()));
    assert_eq!(index.meta("metric").await.unwrap().as_deref(), Some("cosine"));
    assert_eq!(index.meta("embedder_id").await.unwrap().as_deref(), Some("fake-xxhash64-384"));
}

#[tokio::test]
async fn rebuild_replaces_collection() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("docs");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "Espresso is $3.50.").unwrap();
    let mut index = index_in(tmp.path());

    assert_eq!(index.build(&corpus).await.unwrap(), 1);
    assert_eq!(index.build(&corpus).await.unwrap(), 1, "same corpus, same chunk count");

    fs::write(corpus.join("b.txt"), "Latte is $4.75.").unwrap();
    assert_eq!(index.build(&corpus).await.unwrap(), 2);
    assert_eq!(index.search("latte", 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn ensure_built_runs_once() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("pdfs");
    let mut index = index_in(tmp.path());

    assert!(index.ensure_built(&corpus).await.unwrap());
    assert!(!index.ensure_built(&corpus).await.unwrap());
}

#[tokio::test]
async fn build_with_nothing_loadable_keeps_existing_collection() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("docs");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "Espresso is $3.50.").unwrap();
    let mut index = index_in(tmp.path());
    assert_eq!(index.build(&corpus).await.unwrap(), 1);

    fs::remove_file(corpus.join("a.txt")).unwrap();
    fs::write(corpus.join("broken.pdf"), b"%PDF-1.4 not really a pdf").unwrap();

    assert_eq!(index.build(&corpus).await.unwrap(), 0);
    assert!(index.exists());
    assert_eq!(index.search("espresso", 4).await.unwrap().len(), 1);
    assert_eq!(index.meta("chunk_count").await.unwrap().as_deref(), Some("1"));
}

/// Same vector space as `FakeEmbedder` under a different name.
struct Renamed(FakeEmbedder);

impl Embedder for Renamed {
    fn model_id(&self) -> &str { "renamed-384" }
    fn dim(&self) -> usize { self.0.dim() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.0.embed_batch(texts)
    }
}

#[tokio::test]
async fn query_with_other_embedder_id_still_answers() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("docs");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "Espresso is $3.50.").unwrap();
    let mut built = index_in(tmp.path());
    built.build(&corpus).await.unwrap();

    let other = VectorIndex::new(
        tmp.path().join("index"),
        "retail_knowledge",
        Box::new(Renamed(FakeEmbedder::new(MINILM_DIM))),
    );
    let hits = other.search("espresso", 4).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(other.meta("embedder_id").await.unwrap().as_deref(), Some("fake-xxhash64-384"));
}

/// Fails every call after the first.
struct FailsAfterFirst {
    inner: FakeEmbedder,
    calls: AtomicUsize,
}

impl Embedder for FailsAfterFirst {
    fn model_id(&self) -> &str { self.inner.model_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            anyhow::bail!("model crashed");
        }
        self.inner.embed_batch(texts)
    }
}

#[tokio::test]
async fn failed_rebuild_leaves_no_partial_collection() {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("docs");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "Espresso is $3.50.").unwrap();
    fs::write(corpus.join("b.txt"), "Latte is $4.75.").unwrap();
    let embedder = FailsAfterFirst { inner: FakeEmbedder::new(MINILM_DIM), calls: AtomicUsize::new(0) };
    let mut index = VectorIndex::new(tmp.path().join("index"), "retail_knowledge", Box::new(embedder))
        .with_batch_size(1);

    let err = index.build(&corpus).await.unwrap_err();
    assert!(format!("{err:#}").contains("model crashed"));
    assert!(!index.exists());
    assert!(index.retrieve("latte", 4).await.is_empty());
}
