//! Chunk-embedding repository with vector search.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{Chunk, TABLE_EMBEDDINGS};
use crate::schema_arrow::{chunk_to_record, record_to_chunk};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

#[derive(Clone)]
pub struct EmbeddingRepository {
    db: Arc<Database>,
}

impl EmbeddingRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert chunks as one unit: all record batches go through a single
    /// `add`, so a failure leaves no partial batch behind from this call.
    pub async fn insert_batch(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let table = self
            .db
            .connection()
            .open_table(TABLE_EMBEDDINGS)
            .execute()
            .await?;

        let records: Vec<arrow_array::RecordBatch> =
            chunks.iter().map(chunk_to_record).collect::<Result<_>>()?;

        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);

        table.add(iter).execute().await?;
        Ok(chunks.len())
    }

    /// Top-k chunks by vector similarity, restricted by a metadata filter
    /// (SQL-style predicate, e.g. `paper_url = '…'`).
    pub async fn search_similar_filtered(
        &self,
        query_vector: &[f32],
        k: usize,
        filter: &str,
    ) -> Result<Vec<Chunk>> {
        let table = self
            .db
            .connection()
            .open_table(TABLE_EMBEDDINGS)
            .execute()
            .await?;

        let mut stream = table
            .vector_search(query_vector.to_vec())?
            .only_if(filter)
            .limit(k)
            .execute()
            .await?;

        let mut chunks = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                chunks.push(record_to_chunk(&batch, i)?);
            }
        }

        Ok(chunks)
    }

    pub async fn count_for_paper(&self, paper_url: &str) -> Result<u64> {
        let table = self
            .db
            .connection()
            .open_table(TABLE_EMBEDDINGS)
            .execute()
            .await?;
        let escaped = paper_url.replace('\'', "''");
        let count = table
            .count_rows(Some(format!("paper_url = '{}'", escaped)))
            .await?;
        Ok(count as u64)
    }
}
