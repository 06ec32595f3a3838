use std::sync::Arc;

use retail_assist::{AssistError, ContextAssembler, LlmClient, RecordStore, SqliteRecordStore};
use retail_core::geo::{format_distance, nearest_for_customer};
use retail_embed::FakeEmbedder;
use retail_vector::VectorIndex;

async fn seeded() -> SqliteRecordStore {
    let store = SqliteRecordStore::in_memory().await.unwrap();
    assert!(store.init().await.unwrap());
    store
}

#[tokio::test]
async fn seeds_once() {
    let store = seeded().await;
    assert!(!store.init().await.unwrap());
    assert_eq!(store.list_customers().await.unwrap().len(), 10);
}

#[tokio::test]
async fn customer_comes_with_orders_and_coupons() {
    let store = seeded().await;
    let c = store.get_customer(1).await.unwrap().unwrap();
    assert_eq!(c.name, "Neeraj Kumar");
    assert_eq!(c.phone, "+1-555-0101");
    assert_eq!(c.email.as_deref(), Some("neeraj.kumar@example.com"));
    assert!(c.location.is_some());

    let items: Vec<&str> = c.recent_orders.iter().map(|o| o.item_name.as_str()).collect();
    assert_eq!(items, ["Hot Cocoa", "Cappuccino"]);
    assert_eq!(c.recent_orders[0].store_name, "BeanHaven Coffee - Downtown");

    assert_eq!(c.active_coupons.len(), 1);
    assert_eq!(c.active_coupons[0].description, "10% OFF Hot Cocoa");
}

#[tokio::test]
async fn newest_order_first() {
    let store = seeded().await;
    let c = store.get_customer(2).await.unwrap().unwrap();
    assert_eq!(c.recent_orders[0].item_name, "Caramel Latte");
    assert_eq!(c.recent_orders[0].status, "ready");
    assert_eq!(c.recent_orders[1].store_name, "BeanHaven Coffee - Uptown");
}

#[tokio::test]
async fn unknown_customer_is_none() {
    let store = seeded().await;
    assert!(store.get_customer(99).await.unwrap().is_none());
}

#[tokio::test]
async fn facilities_in_id_order_and_customers_by_name() {
    let store = seeded().await;
    let ids: Vec<i64> = store.get_facilities().await.unwrap().iter().map(|f| f.id).collect();
    assert_eq!(ids, [1, 2, 3]);

    let names: Vec<String> = store.list_customers().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names.first().map(String::as_str), Some("Alice Johnson"));
    assert_eq!(names.last().map(String::as_str), Some("Sarah Williams"));
}

#[tokio::test]
async fn nearest_store_for_seeded_customer() {
    let store = seeded().await;
    let lisa = store.get_customer(8).await.unwrap().unwrap();
    let facilities = store.get_facilities().await.unwrap();
    let ranked = nearest_for_customer(&lisa, &facilities).unwrap();
    assert_eq!(ranked.facility.name, "BeanHaven Coffee - Midtown");
    assert_eq!(format_distance(ranked.distance_m), "148 m");
}

#[tokio::test]
async fn file_database_persists_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retail.db");
    {
        let store = SqliteRecordStore::open(&path).await.unwrap();
        assert!(store.init().await.unwrap());
        store.pool().close().await;
    }
    let reopened = SqliteRecordStore::open(&path).await.unwrap();
    assert!(!reopened.init().await.unwrap());
    assert_eq!(reopened.get_facilities().await.unwrap().len(), 3);
}

struct Echo;

#[async_trait::async_trait]
impl LlmClient for Echo {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, AssistError> {
        Ok(user.to_string())
    }
}

#[tokio::test]
async fn full_turn_over_sqlite_and_vector_index() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    let mut index = VectorIndex::new(dir.path().join("index"), "retail_knowledge", Box::new(FakeEmbedder::new(384)));
    assert!(index.ensure_built(&corpus).await.unwrap());

    let docs = index.retrieve("What is your refund policy?", 4).await;
    assert!(!docs.is_empty());

    let asm = ContextAssembler::new(Arc::new(seeded().await), Arc::new(index), Arc::new(Echo));
    // The echoed prompt is unmasked on the way back, so the real phone number reappears.
    let reply = asm.respond(Some(1), "What is your refund policy? I'm at +1-555-0101").await;
    assert!(reply.contains("Name: Neeraj Kumar"));
    assert!(reply.contains("Phone: +1-555-0101"));
    assert!(reply.contains("[Document 1]"));
    assert!(reply.to_lowercase().contains("refund"));
}
