//! Unstructured partition client — turns raw PDF bytes into ordered text
//! chunks with page provenance.
//!
//! The service takes a staged file, so bytes are materialized into a
//! `NamedTempFile` first; the temp file is removed on every exit path when
//! the handle drops.

use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

const UNSTRUCTURED_DEFAULT_URL: &str = "https://api.unstructuredapp.io";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("partition failed [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("partition returned no text elements")]
    Empty,
}

/// A span of extracted text with its page provenance. Gains paper provenance
/// (URL, index) when the pipeline turns it into a stored chunk.
#[derive(Debug, Clone)]
pub struct ExtractedChunk {
    pub content: String,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionElement {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: ElementMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementMetadata {
    pub page_number: Option<i64>,
}

/// Unstructured service client.
pub struct UnstructuredClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl UnstructuredClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url.unwrap_or(UNSTRUCTURED_DEFAULT_URL).to_string(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Stage the bytes and partition them. Zero elements on a non-empty
    /// document is a failure: note generation cannot run on no text.
    pub async fn partition(&self, pdf: &[u8]) -> Result<Vec<ExtractedChunk>, ExtractError> {
        let mut staged = NamedTempFile::new()?;
        std::io::Write::write_all(&mut staged, pdf)?;

        // `staged` drops (and unlinks) whether or not the call succeeds.
        self.partition_file(staged.path()).await
    }

    async fn partition_file(&self, path: &Path) -> Result<Vec<ExtractedChunk>, ExtractError> {
        let file_bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf");

        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;

        let form = reqwest::multipart::Form::new()
            .part("files", part)
            .text("strategy", "hi_res");

        let resp = self
            .client
            .post(format!("{}/general/v0/general", self.base_url))
            .header("unstructured-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, message });
        }

        let elements: Vec<PartitionElement> = resp.json().await?;
        debug!(n_elements = elements.len(), "partition response received");

        let chunks = elements_to_chunks(elements);
        if chunks.is_empty() {
            return Err(ExtractError::Empty);
        }
        Ok(chunks)
    }
}

/// Map partition elements to chunks, preserving order and dropping
/// whitespace-only elements.
pub fn elements_to_chunks(elements: Vec<PartitionElement>) -> Vec<ExtractedChunk> {
    elements
        .into_iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| ExtractedChunk {
            content: e.text,
            page: e.metadata.page_number,
        })
        .collect()
}
