use std::env;
use std::path::PathBuf;

use retail_assist::logging;
use retail_core::config::Config;
use retail_vector::VectorIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_cli();
    let settings = Config::load()
        .map_err(|e| { eprintln!("Error loading config: {}", e); e })?
        .settings()?;

    let corpus_dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| settings.data.corpus_dir());

    println!("Retail Knowledge Indexer\n========================");
    println!("Corpus directory: {}", corpus_dir.display());
    println!("Index directory:  {}", settings.data.index_dir().display());

    let mut index = VectorIndex::from_settings(&settings)?;
    println!("Embedder: {}", index.embedder().model_id());
    let count = index.build(&corpus_dir).await?;

    if count == 0 {
        println!("\n⚠️  No documents could be loaded; existing index left unchanged");
    } else {
        println!("\n✅ Indexing completed successfully!");
        println!("📊 Indexed {} chunks into '{}'", count, index.collection());
    }
    println!("\n💡 To chat, use: cargo run --bin retail-chat -- --customer 1");
    Ok(())
}
