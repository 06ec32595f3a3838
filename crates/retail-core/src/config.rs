//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g. `APP_INDEX__TOP_K`).
//! Provides a helper to expand `~` and `${VAR}` in configured paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load with an explicit base directory and environment name.
    pub fn load_from(base: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the typed settings tree and validate it.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                // Production never runs on the hashing embedder.
                let fake: bool = self.get("index.fake_embeddings").unwrap_or(false);
                if fake {
                    anyhow::bail!("index.fake_embeddings must be false in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub llm: LlmSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let ix = &self.index;
        if ix.chunk_size == 0 {
            return Err(Error::InvalidConfig("index.chunk_size must be > 0".into()));
        }
        if ix.chunk_overlap >= ix.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                ix.chunk_overlap, ix.chunk_size
            )));
        }
        if ix.top_k == 0 {
            return Err(Error::InvalidConfig("index.top_k must be > 0".into()));
        }
        if ix.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_dir: String,
    pub index_dir: String,
    pub db_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            corpus_dir: "data/pdfs".to_string(),
            index_dir: "data/index".to_string(),
            db_path: "hyper_support.db".to_string(),
        }
    }
}

impl DataSettings {
    pub fn corpus_dir(&self) -> PathBuf { expand_path(&self.corpus_dir) }
    pub fn index_dir(&self) -> PathBuf { expand_path(&self.index_dir) }
    pub fn db_path(&self) -> PathBuf { expand_path(&self.db_path) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub batch_size: usize,
    pub embedding_model: String,
    pub model_dir: Option<String>,
    pub fake_embeddings: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            collection: "retail_knowledge".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 4,
            batch_size: 100,
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_dir: None,
            fake_embeddings: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    /// Name of the environment variable holding the provider key.
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            temperature: 0.7,
            max_completion_tokens: 1024,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
