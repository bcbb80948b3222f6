//! Knowledge-store integration tests against a throwaway embedded LanceDB
//! database. The embedding backend is a deterministic stub, so everything
//! here runs offline.

use std::sync::Arc;

use async_trait::async_trait;
use marginalia_llm::{ChatOutcome, ChatRequest, LlmBackend, LlmError};
use marginalia_store::{Chunk, KnowledgeStore, PaperNote, StoreError, EMBEDDING_DIM};

/// Deterministic embedder: folds bytes into a fixed-size vector and
/// normalizes, so identical text gets an identical vector.
struct StubBackend;

#[async_trait]
impl LlmBackend for StubBackend {
    async fn chat(&self, _req: ChatRequest) -> Result<ChatOutcome, LlmError> {
        Ok(ChatOutcome::Reply("stub".to_string()))
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; EMBEDDING_DIM];
                for (i, b) in text.bytes().enumerate() {
                    v[i % EMBEDDING_DIM] += b as f32 / 255.0;
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
                v.iter().map(|x| x / norm).collect()
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

async fn open_store(dir: &tempfile::TempDir) -> KnowledgeStore {
    KnowledgeStore::connect(dir.path().to_str().unwrap(), None, Arc::new(StubBackend))
        .await
        .expect("store should open on a fresh directory")
}

fn sample_notes() -> Vec<PaperNote> {
    vec![
        PaperNote { note: "introduces a retrieval benchmark".to_string() },
        PaperNote { note: "reports 4% gain over baseline".to_string() },
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn test_paper_round_trip_and_duplicate_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let url = "https://example.com/paper.pdf";

    let stored = store
        .put_paper(url, "test paper", "full text".to_string(), sample_notes())
        .await
        .unwrap();
    assert_eq!(stored.notes.len(), 2);

    let fetched = store.get_paper(url).await.unwrap();
    assert_eq!(fetched.url, url);
    assert_eq!(fetched.name, "test paper");
    assert_eq!(fetched.notes, sample_notes());

    // Re-reading is idempotent.
    let again = store.get_paper(url).await.unwrap();
    assert_eq!(again.id, fetched.id);

    // Re-ingesting the same URL is rejected, not upserted.
    let err = store
        .put_paper(url, "other name", "other text".to_string(), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
    assert_eq!(store.paper_count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_paper_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let err = store.get_paper("https://example.com/absent.pdf").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chunks_index_and_filtered_similarity_search() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let url = "https://example.com/paper.pdf";
    let other_url = "https://example.com/other.pdf";

    let chunks = vec![
        Chunk::new(url.to_string(), 0, "transformers use attention".to_string(), Some(1)),
        Chunk::new(url.to_string(), 1, "the benchmark has 500 tasks".to_string(), Some(2)),
        Chunk::new(url.to_string(), 2, "training ran for ten days".to_string(), Some(5)),
    ];
    assert_eq!(store.put_chunks(chunks).await.unwrap(), 3);

    // A chunk from another paper must never leak through the filter.
    let foreign = vec![Chunk::new(
        other_url.to_string(),
        0,
        "transformers use attention".to_string(),
        None,
    )];
    store.put_chunks(foreign).await.unwrap();

    assert_eq!(store.chunk_count_for_paper(url).await.unwrap(), 3);

    let hits = store
        .similarity_search("the benchmark has 500 tasks", 2, url)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|c| c.paper_url == url));
    // The identical text embeds to the identical vector, so it ranks first.
    assert_eq!(hits[0].content, "the benchmark has 500 tasks");

    // Low relevance still returns results, never an error.
    let unrelated = store
        .similarity_search("completely unrelated query", 8, url)
        .await
        .unwrap();
    assert_eq!(unrelated.len(), 3);

    // No chunks matching the filter is an empty result.
    let none = store
        .similarity_search("anything", 8, "https://example.com/unknown.pdf")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_qa_log_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    store
        .put_qa("q", "a1", "ctx", vec!["f1".to_string()])
        .await
        .unwrap();
    // The same content again is a legitimate new row.
    store
        .put_qa("q", "a1", "ctx", vec!["f1".to_string()])
        .await
        .unwrap();

    assert_eq!(store.qa_count().await.unwrap(), 2);
}
