use std::env;
use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use retail_assist::{logging, ContextAssembler, GroqClient, SqliteRecordStore};
use retail_core::config::Config;
use retail_vector::VectorIndex;

struct Args {
    customer: Option<i64>,
    message: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut customer = None;
    let mut words = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--customer" | "-c" => {
                match args.get(i + 1).and_then(|v| v.parse::<i64>().ok()) {
                    Some(id) => { customer = Some(id); i += 1; }
                    None => { eprintln!("Error: --customer requires a numeric id"); std::process::exit(1); }
                }
            }
            other => words.push(other.to_string()),
        }
        i += 1;
    }
    let message = if words.is_empty() { None } else { Some(words.join(" ")) };
    Args { customer, message }
}

async fn print_customers(store: &SqliteRecordStore) -> anyhow::Result<()> {
    for c in store.list_customers().await? {
        println!("  {:>3}  {} ({})", c.id, c.name, c.loyalty_level.as_deref().unwrap_or("-"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_cli();
    let settings = Config::load()
        .map_err(|e| { eprintln!("Error loading config: {}", e); e })?
        .settings()?;
    let Args { mut customer, message } = parse_args();

    let store = Arc::new(SqliteRecordStore::open(&settings.data.db_path()).await?);
    if store.init().await? {
        println!("🗄️  Seeded demo customers and stores into {}", settings.data.db_path().display());
    }

    let mut index = VectorIndex::from_settings(&settings)?;
    if index.ensure_built(&settings.data.corpus_dir()).await? {
        println!("📚 Built knowledge index '{}'", index.collection());
    }

    let assembler = ContextAssembler::new(store.clone(), Arc::new(index), Arc::new(GroqClient::new(settings.llm.clone())))
        .with_top_k(settings.index.top_k);

    if let Some(message) = message {
        println!("{}", assembler.respond(customer, &message).await);
        return Ok(());
    }

    println!("☕ BeanHaven assistant. /customers lists customers, /customer ID switches, /quit exits.");
    if customer.is_none() {
        println!("💡 No customer selected; answers will not be personalized.");
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", customer.map(|id| format!("[{id}] ")).unwrap_or_default());
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] | ["/exit"] => break,
            ["/customers"] => print_customers(&store).await?,
            ["/customer", id] => match id.parse::<i64>() {
                Ok(id) => { customer = Some(id); println!("👤 Switched to customer {id}"); }
                Err(_) => println!("⚠️  Not a customer id: {id}"),
            },
            _ => println!("\n{}\n", assembler.respond(customer, line).await),
        }
    }
    Ok(())
}
