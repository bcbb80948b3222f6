//! QA pipeline integration tests against an embedded store and a scripted
//! backend, so the whole retrieve → generate → persist flow runs offline.

use std::sync::Arc;

use async_trait::async_trait;
use marginalia_llm::{
    ChatOutcome, ChatRequest, LlmBackend, LlmError, StructuredGenerator, ToolCall, ToolChoice,
};
use marginalia_qa::QaPipeline;
use marginalia_store::{Chunk, KnowledgeStore, PaperNote, EMBEDDING_DIM};

/// Backend that embeds deterministically and always answers with two
/// scripted candidates.
struct ScriptedBackend;

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn chat(&self, req: ChatRequest) -> Result<ChatOutcome, LlmError> {
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.tool_choice, ToolChoice::Auto);
        Ok(ChatOutcome::ToolCalls(vec![ToolCall {
            name: "record_answers".to_string(),
            arguments: r#"{"answers":[
                {"answer":"the gain is 4%","followup_questions":["on which benchmark?"]},
                {"answer":"four percent over baseline","followup_questions":[]}
            ]}"#
            .to_string(),
        }]))
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; EMBEDDING_DIM];
                for (i, b) in text.bytes().enumerate() {
                    v[i % EMBEDDING_DIM] += b as f32 / 255.0;
                }
                v
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_each_candidate_answer_becomes_a_qa_record() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend);
    let store = Arc::new(
        KnowledgeStore::connect(dir.path().to_str().unwrap(), None, backend.clone())
            .await
            .unwrap(),
    );

    let url = "https://example.com/paper.pdf";
    store
        .put_paper(
            url,
            "test paper",
            "full text".to_string(),
            vec![PaperNote { note: "reports a 4% gain".to_string() }],
        )
        .await
        .unwrap();
    store
        .put_chunks(vec![
            Chunk::new(url.to_string(), 0, "we observe a 4% gain".to_string(), Some(3)),
            Chunk::new(url.to_string(), 1, "related work".to_string(), Some(1)),
        ])
        .await
        .unwrap();

    let qa = QaPipeline::new(StructuredGenerator::new(backend), store.clone());
    let answers = qa.answer_question("how large is the gain?", url).await.unwrap();

    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].answer, "the gain is 4%");
    assert_eq!(answers[0].followup_questions, vec!["on which benchmark?"]);

    // Scenario: two candidates → exactly two transcript rows.
    assert_eq!(store.qa_count().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_paper_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend);
    let store = Arc::new(
        KnowledgeStore::connect(dir.path().to_str().unwrap(), None, backend.clone())
            .await
            .unwrap(),
    );

    let qa = QaPipeline::new(StructuredGenerator::new(backend), store);
    let err = qa
        .answer_question("anything", "https://example.com/absent.pdf")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        marginalia_qa::QaError::Store(marginalia_store::StoreError::NotFound(_))
    ));
}
