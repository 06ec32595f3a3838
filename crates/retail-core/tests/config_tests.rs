use std::fs;

use retail_core::config::Config;

const BASE: &str = r#"
[data]
corpus_dir = "corpus"

[index]
top_k = 3
fake_embeddings = false
"#;

#[test]
fn environment_file_layers_over_base_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), BASE).unwrap();
    fs::write(dir.path().join("config.test.toml"), "[index]\nfake_embeddings = true\n").unwrap();

    let settings = Config::load_from(dir.path(), "test").unwrap().settings().unwrap();
    assert!(settings.index.fake_embeddings);
    assert_eq!(settings.data.corpus_dir, "corpus");
    // Keys absent from both files keep their built-in defaults.
    assert_eq!(settings.index.chunk_size, 500);

    // An unknown environment only reads the base file.
    let settings = Config::load_from(dir.path(), "staging").unwrap().settings().unwrap();
    assert!(!settings.index.fake_embeddings);
}

#[test]
fn app_variables_override_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), BASE).unwrap();

    // The only test in this binary that touches APP_* variables.
    std::env::set_var("APP_INDEX__TOP_K", "7");
    let loaded = Config::load_from(dir.path(), "dev");
    std::env::remove_var("APP_INDEX__TOP_K");

    let settings = loaded.unwrap().settings().unwrap();
    assert_eq!(settings.index.top_k, 7);
}

#[test]
fn production_rejects_fake_embeddings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), BASE).unwrap();
    fs::write(dir.path().join("config.prod.toml"), "[index]\nfake_embeddings = true\n").unwrap();

    let err = Config::load_from(dir.path(), "prod").err().expect("prod must refuse fake embeddings");
    assert!(err.to_string().contains("fake_embeddings"));

    // The same files are fine outside production.
    assert!(Config::load_from(dir.path(), "dev").is_ok());
}

#[test]
fn invalid_chunking_is_reported_by_settings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[index]\nchunk_size = 40\nchunk_overlap = 40\n").unwrap();

    let config = Config::load_from(dir.path(), "dev").unwrap();
    assert!(config.settings().is_err());
}
