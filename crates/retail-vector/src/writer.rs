use anyhow::{ensure, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::Connection;
use std::sync::Arc;

use retail_core::types::DocumentChunk;

use crate::schema::build_chunk_schema;
use crate::table::has_table;

/// One Arrow batch of chunks and their vectors, row for row.
pub fn chunks_to_record_batch(chunks: &[DocumentChunk], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
    ensure!(chunks.len() == vectors.len(), "chunks and embeddings length must match");
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        anyhow::bail!("embedding has {} dims, collection expects {}", bad.len(), dim);
    }
    let dim = i32::try_from(dim)?;

    let schema = build_chunk_schema(dim);
    let vectors = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
    let record_batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_path.as_str()))),
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.content.as_str()))),
            Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.chunk_index as i32))),
            Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.total_chunks as i32))),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
        ],
    )?;
    Ok(record_batch)
}

/// Append to `table`, creating it from the first batch.
pub async fn insert_batch(conn: &Connection, table: &str, batch: RecordBatch) -> Result<()> {
    if batch.num_rows() == 0 {
        return Ok(());
    }
    let schema = batch.schema();
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    if has_table(conn, table).await? {
        conn.open_table(table).execute().await?.add(reader).execute().await?;
    } else {
        conn.create_table(table, reader).execute().await?;
    }
    Ok(())
}
