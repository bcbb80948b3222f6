//! PDF acquisition: fetch bytes by URL and strip unwanted pages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("pdf fetch failed: {0}")]
    Fetch(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed pdf document: {0}")]
    MalformedDocument(String),
}

/// Download a PDF. Non-2xx responses and non-PDF bodies are fetch failures.
pub async fn fetch_pdf(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, AcquireError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(AcquireError::Fetch(format!(
            "pdf download failed: HTTP {}",
            resp.status()
        )));
    }

    let bytes = resp.bytes().await?;
    if !bytes.starts_with(b"%PDF") {
        return Err(AcquireError::Fetch(format!(
            "{url} did not return a pdf body"
        )));
    }

    Ok(bytes.to_vec())
}

/// Remove the given 1-based pages from a PDF. Input order and duplicates
/// don't matter; each deletion shrinks the document, so later targets are
/// shifted down by the number of lower pages already removed.
pub fn remove_pages(pdf: &[u8], pages_to_delete: &[u32]) -> Result<Vec<u8>, AcquireError> {
    let mut doc = lopdf::Document::load_mem(pdf)
        .map_err(|e| AcquireError::MalformedDocument(e.to_string()))?;

    let page_count = doc.get_pages().len() as u32;

    let mut targets: Vec<u32> = pages_to_delete.to_vec();
    targets.sort_unstable();
    targets.dedup();

    for &page in &targets {
        if page == 0 || page > page_count {
            return Err(AcquireError::MalformedDocument(format!(
                "page {page} out of range for a {page_count}-page document"
            )));
        }
    }

    for (removed, &page) in targets.iter().enumerate() {
        doc.delete_pages(&[page - removed as u32]);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| AcquireError::MalformedDocument(e.to_string()))?;
    Ok(out)
}
