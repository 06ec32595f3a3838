pub mod device;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use retail_core::config::{expand_path, IndexSettings};
pub use retail_core::traits::Embedder;

pub use pool::masked_mean_l2;

/// Output width of all-MiniLM-L6-v2.
pub const MINILM_DIM: usize = 384;
const MAX_LEN: usize = 256;
const PAD_ID: u32 = 0;

/// Local sentence-transformer (BERT) on candle: mean pooling + L2.
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dim: usize,
}

impl MiniLmEmbedder {
    /// Load tokenizer, config and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors` when present, otherwise from
    /// `pytorch_model.bin`.
    pub fn load(model_dir: &Path, model_id: &str) -> Result<Self> {
        let device = device::select_device();
        tracing::info!("loading embedding model {} from {}", model_id, model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .map_or(MINILM_DIM, |v| v as usize);

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DTYPE, &device);
        let model = BertModel::load(vb, &config)?;
        tracing::info!("embedding model ready (dim {})", dim);

        Ok(Self { model, tokenizer, device, model_id: model_id.to_string(), dim })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device)
            .with_context(|| format!("load {}", safetensors.display()));
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pickle)
        .with_context(|| format!("load {}", pickle.display()))?;
    weights
        .into_iter()
        .map(|(name, t)| Ok((name, t.to_device(device)?)))
        .collect()
}

impl Embedder for MiniLmEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize::tokenize_batch(&self.tokenizer, texts, MAX_LEN, PAD_ID, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!("embedded {} texts in {:?}", texts.len(), start.elapsed());
        Ok(vectors)
    }
}

/// Hashing bag-of-words embedder. Deterministic and weight-free; shares no
/// embedding space with any neural model.
pub struct FakeEmbedder {
    dim: usize,
    model_id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), model_id: format!("fake-xxhash64-{dim}") }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Embedder selected by configuration.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` or `index.fake_embeddings = true` picks the
/// hashing embedder; otherwise the sentence-transformer is loaded from disk.
pub fn get_default_embedder(settings: &IndexSettings) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if env_fake || settings.fake_embeddings {
        tracing::info!("using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(MINILM_DIM)));
    }
    let dir = resolve_model_dir(settings)?;
    Ok(Box::new(MiniLmEmbedder::load(&dir, &settings.embedding_model)?))
}

/// Locate the model directory: `index.model_dir`, then `APP_MODEL_DIR`, then
/// `MODEL_DIR`, then `models/<name>` relative to the working directory or its
/// parent.
pub fn resolve_model_dir(settings: &IndexSettings) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = &settings.model_dir {
        candidates.push(expand_path(dir));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            candidates.push(expand_path(dir));
        }
    }
    let short = settings.embedding_model.rsplit('/').next().unwrap_or(&settings.embedding_model);
    candidates.push(Path::new("models").join(short));
    candidates.push(Path::new("../models").join(short));

    candidates
        .into_iter()
        .find(|p| p.exists())
        .inspect(|p| tracing::info!("using model dir: {}", p.display()))
        .ok_or_else(|| anyhow!("Could not locate model directory for {}", settings.embedding_model))
}
