use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};

use retail_core::types::SearchHit;

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{}' missing from search result", name))
}

/// Rows of a vector-search result as hits. Score is `1 - cosine distance`.
pub fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let ids = string_col(batch, "id")?;
    let sources = string_col(batch, "source")?;
    let contents = string_col(batch, "content")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    Ok((0..batch.num_rows())
        .map(|i| SearchHit {
            id: ids.value(i).to_string(),
            score: distances.map_or(0.0, |d| if d.is_null(i) { 0.0 } else { 1.0 - d.value(i) }),
            source: sources.value(i).to_string(),
            content: contents.value(i).to_string(),
        })
        .collect())
}
