//! Domain types shared by the index, the masking engine and the assembler.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

pub type ChunkId = String;

/// A chunk of a source document that is independently indexed.
///
/// - `id`: chunk identifier, `"{doc_id}:{chunk_index}"`
/// - `doc_id`: stable document identity (file stem)
/// - `doc_path`: original path to the source file (provenance)
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
///
/// Chunks are immutable once written to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// One ranked retrieval result.
///
/// `score` is cosine similarity (`1 - distance`), higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub item_name: String,
    pub item_type: String,
    pub size: String,
    pub status: String,
    pub timestamp: String,
    pub store_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub description: String,
    pub product_name: String,
    pub discount_percent: f64,
    pub valid_until: String,
}

/// A customer as handed out by the record store.
///
/// `phone` and `email` are the only fields treated as PII; everything else
/// reaches the model as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub location: Option<Coordinate>,
    pub preferred_drink: Option<String>,
    pub loyalty_level: Option<String>,
    #[serde(default)]
    pub recent_orders: Vec<OrderSummary>,
    #[serde(default)]
    pub active_coupons: Vec<Coupon>,
}
