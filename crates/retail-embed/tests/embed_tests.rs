use retail_core::config::IndexSettings;
use retail_embed::{get_default_embedder, Embedder, FakeEmbedder, MINILM_DIM};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = IndexSettings { fake_embeddings: true, ..IndexSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");

    assert_eq!(embs.len(), 2);
    assert_eq!(embs[0].len(), MINILM_DIM);
    assert_eq!(embedder.dim(), MINILM_DIM);

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    assert_eq!(embs[0], embs[1]);
}

#[test]
fn fake_embedder_ranks_shared_words_higher() {
    let e = FakeEmbedder::new(MINILM_DIM);
    let q = e.embed_one("What is your refund policy?").unwrap();
    let related = e.embed_one("Q: What is your refund policy? A: full refund within 10 minutes").unwrap();
    let unrelated = e.embed_one("Cold Brew: $4.50").unwrap();

    assert!(cosine(&q, &related) > cosine(&q, &unrelated));
}

#[test]
fn empty_text_embeds_to_zero_vector() {
    let e = FakeEmbedder::new(8);
    let v = e.embed_one("   ").unwrap();
    assert_eq!(v, vec![0.0; 8]);
}

#[test]
fn model_ids_name_the_space() {
    assert_eq!(FakeEmbedder::new(384).model_id(), "fake-xxhash64-384");
}
