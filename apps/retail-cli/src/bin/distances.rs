use retail_assist::{logging, RecordStore, SqliteRecordStore};
use retail_core::config::Config;
use retail_core::geo::{format_distance, nearest_for_customer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_cli();
    let settings = Config::load()
        .map_err(|e| { eprintln!("Error loading config: {}", e); e })?
        .settings()?;

    let store = SqliteRecordStore::open(&settings.data.db_path()).await?;
    store.init().await?;
    let facilities = store.get_facilities().await?;

    println!("Nearest store per customer\n==========================");
    for customer in store.list_customers().await? {
        match nearest_for_customer(&customer, &facilities) {
            Some(r) if r.measured => {
                println!("📍 {:<20} → {} ({})", customer.name, r.facility.name, format_distance(r.distance_m));
            }
            Some(r) => println!("❓ {:<20} → {} (location unknown)", customer.name, r.facility.name),
            None => println!("❌ {:<20} → no stores", customer.name),
        }
    }
    Ok(())
}
