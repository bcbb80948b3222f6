//! QA transcript repository. Append-only; duplicate content is legitimate
//! (the same question can be asked twice).

use crate::database::Database;
use crate::error::Result;
use crate::schema::{QaRecord, TABLE_QA};
use crate::schema_arrow::qa_to_record;
use std::sync::Arc;

#[derive(Clone)]
pub struct QaRepository {
    db: Arc<Database>,
}

impl QaRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, qa: &QaRecord) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_QA).execute().await?;

        let record = qa_to_record(qa)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_QA).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
