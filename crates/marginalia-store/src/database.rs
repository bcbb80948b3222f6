//! Database connection and table management.

use crate::error::Result;
use crate::schema::{TABLE_EMBEDDINGS, TABLE_PAPERS, TABLE_QA};
use crate::schema_arrow;
use arrow_array::RecordBatchIterator;
use lancedb::connection::Connection;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    uri: String,
}

impl Database {
    /// Open or create a database. `uri` is either a local data directory or
    /// a `db://` remote URI; `api_key` applies only to the latter.
    pub async fn open(uri: &str, api_key: Option<&str>) -> Result<Self> {
        // Local directories must exist before LanceDB opens them.
        if !uri.contains("://") && !std::path::Path::new(uri).exists() {
            std::fs::create_dir_all(uri)?;
        }

        let mut builder = lancedb::connect(uri);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let conn = builder.execute().await?;

        Ok(Self {
            conn,
            uri: uri.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Create the papers, embeddings and qa tables if they don't exist.
    /// LanceDB needs a schema-carrying (empty) batch iterator to create a table.
    pub async fn initialize(&self) -> Result<()> {
        if !self.table_exists(TABLE_PAPERS).await? {
            let schema = schema_arrow::paper_schema();
            let empty_iter = RecordBatchIterator::new(vec![], schema);
            self.conn.create_table(TABLE_PAPERS, empty_iter).execute().await?;
        }

        if !self.table_exists(TABLE_EMBEDDINGS).await? {
            let schema = schema_arrow::chunk_schema();
            let empty_iter = RecordBatchIterator::new(vec![], schema);
            self.conn
                .create_table(TABLE_EMBEDDINGS, empty_iter)
                .execute()
                .await?;
        }

        if !self.table_exists(TABLE_QA).await? {
            let schema = schema_arrow::qa_schema();
            let empty_iter = RecordBatchIterator::new(vec![], schema);
            self.conn.create_table(TABLE_QA, empty_iter).execute().await?;
        }

        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let tables = self.conn.table_names().execute().await?;
        Ok(tables.contains(&name.to_string()))
    }
}
