//! Paper repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{Paper, TABLE_PAPERS};
use crate::schema_arrow::{paper_to_record, record_to_paper};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

#[derive(Clone)]
pub struct PaperRepository {
    db: Arc<Database>,
}

impl PaperRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new paper row. Notes travel inside the row, so paper text
    /// and notes commit together or not at all.
    pub async fn insert(&self, paper: &Paper) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_PAPERS).execute().await?;

        let record = paper_to_record(paper)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    /// Find a paper by source URL. Returns the first match.
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Paper>> {
        let table = self.db.connection().open_table(TABLE_PAPERS).execute().await?;

        let escaped = url.replace('\'', "''");

        let mut stream = table
            .query()
            .only_if(format!("url = '{}'", escaped))
            .execute()
            .await?;

        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_paper(&batch, 0)?));
            }
        }

        Ok(None)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_PAPERS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
