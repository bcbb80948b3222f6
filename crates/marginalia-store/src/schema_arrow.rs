//! Arrow schemas and record-batch conversions for the LanceDB tables.
//!
//! Notes and follow-up questions are serialized to JSON text columns on
//! write; reads deserialize them back and fail with `InvalidRecord` rather
//! than trusting the stored shape.

use crate::error::{Result, StoreError};
use crate::schema::*;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

// =============================================================================
// Paper Arrow Conversion
// =============================================================================

pub fn paper_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("url", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("notes", DataType::Utf8, false),
        Field::new("ingested_at", DataType::Utf8, false),
    ]))
}

pub fn paper_to_record(paper: &Paper) -> Result<RecordBatch> {
    let schema = paper_schema();

    let id = StringArray::from(vec![paper.id.to_string()]);
    let url = StringArray::from(vec![paper.url.as_str()]);
    let name = StringArray::from(vec![paper.name.as_str()]);
    let text = StringArray::from(vec![paper.text.as_str()]);
    let notes = StringArray::from(vec![serde_json::to_string(&paper.notes)?]);
    let ingested_at = StringArray::from(vec![paper.ingested_at.to_rfc3339()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(url),
            Arc::new(name),
            Arc::new(text),
            Arc::new(notes),
            Arc::new(ingested_at),
        ],
    )
    .map_err(|e| StoreError::Arrow(e.to_string()))
}

pub fn record_to_paper(batch: &RecordBatch, row: usize) -> Result<Paper> {
    let get_string = |col: usize| -> String {
        let arr = batch.column(col).as_any().downcast_ref::<StringArray>().unwrap();
        arr.value(row).to_string()
    };

    let raw_notes = get_string(4);
    let notes: Vec<PaperNote> = serde_json::from_str(&raw_notes)
        .map_err(|e| StoreError::InvalidRecord(format!("notes column is not valid JSON: {e}")))?;

    Ok(Paper {
        id: uuid::Uuid::parse_str(&get_string(0))
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?,
        url: get_string(1),
        name: get_string(2),
        text: get_string(3),
        notes,
        ingested_at: chrono::DateTime::parse_from_rfc3339(&get_string(5))
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

// =============================================================================
// Chunk Arrow Conversion
// =============================================================================

pub fn chunk_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("paper_url", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int64, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("page", DataType::Int64, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                EMBEDDING_DIM as i32,
            ),
            true,
        ),
    ]))
}

pub fn chunk_to_record(chunk: &Chunk) -> Result<RecordBatch> {
    let schema = chunk_schema();

    let id = StringArray::from(vec![chunk.id.to_string()]);
    let paper_url = StringArray::from(vec![chunk.paper_url.as_str()]);
    let chunk_index = Int64Array::from(vec![chunk.chunk_index]);
    let content = StringArray::from(vec![chunk.content.as_str()]);
    let page = Int64Array::from(vec![chunk.page]);
    let created_at = StringArray::from(vec![chunk.created_at.to_rfc3339()]);

    let embedding: Arc<dyn Array> = if let Some(ref emb) = chunk.embedding {
        let values = Float32Array::from(emb.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        Arc::new(
            FixedSizeListArray::try_new(field, EMBEDDING_DIM as i32, Arc::new(values), None)
                .map_err(|e| StoreError::Arrow(e.to_string()))?,
        )
    } else {
        Arc::new(FixedSizeListArray::new_null(
            Arc::new(Field::new("item", DataType::Float32, false)),
            EMBEDDING_DIM as i32,
            1,
        ))
    };

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(paper_url),
            Arc::new(chunk_index),
            Arc::new(content),
            Arc::new(page),
            Arc::new(created_at),
            embedding,
        ],
    )
    .map_err(|e| StoreError::Arrow(e.to_string()))
}

pub fn record_to_chunk(batch: &RecordBatch, row: usize) -> Result<Chunk> {
    let get_string = |col: usize| -> String {
        batch
            .column(col)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .value(row)
            .to_string()
    };

    let get_i64 = |col: usize| -> i64 {
        batch
            .column(col)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .value(row)
    };

    let get_opt_i64 = |col: usize| -> Option<i64> {
        let arr = batch.column(col).as_any().downcast_ref::<Int64Array>().unwrap();
        if arr.is_null(row) {
            None
        } else {
            Some(arr.value(row))
        }
    };

    let get_embedding = |col: usize| -> Option<Vec<f32>> {
        let arr = batch.column(col);
        if arr.is_null(row) {
            return None;
        }
        let list_arr = arr.as_any().downcast_ref::<FixedSizeListArray>().unwrap();
        if list_arr.is_null(row) {
            return None;
        }
        let values = list_arr.value(row);
        let float_arr = values.as_any().downcast_ref::<Float32Array>().unwrap();
        Some(float_arr.values().to_vec())
    };

    Ok(Chunk {
        id: uuid::Uuid::parse_str(&get_string(0))
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?,
        paper_url: get_string(1),
        chunk_index: get_i64(2),
        content: get_string(3),
        page: get_opt_i64(4),
        created_at: chrono::DateTime::parse_from_rfc3339(&get_string(5))
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
        embedding: get_embedding(6),
    })
}

// =============================================================================
// QA Arrow Conversion
// =============================================================================

pub fn qa_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("question", DataType::Utf8, false),
        Field::new("answer", DataType::Utf8, false),
        Field::new("context", DataType::Utf8, false),
        Field::new("followup_questions", DataType::Utf8, false),
        Field::new("asked_at", DataType::Utf8, false),
    ]))
}

pub fn qa_to_record(qa: &QaRecord) -> Result<RecordBatch> {
    let schema = qa_schema();

    let id = StringArray::from(vec![qa.id.to_string()]);
    let question = StringArray::from(vec![qa.question.as_str()]);
    let answer = StringArray::from(vec![qa.answer.as_str()]);
    let context = StringArray::from(vec![qa.context.as_str()]);
    let followups = StringArray::from(vec![serde_json::to_string(&qa.followup_questions)?]);
    let asked_at = StringArray::from(vec![qa.asked_at.to_rfc3339()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(question),
            Arc::new(answer),
            Arc::new(context),
            Arc::new(followups),
            Arc::new(asked_at),
        ],
    )
    .map_err(|e| StoreError::Arrow(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_notes_survive_the_json_column() {
        let paper = Paper::new(
            "https://example.com/paper.pdf".to_string(),
            "test".to_string(),
            "full text".to_string(),
            vec![
                PaperNote { note: "first finding".to_string() },
                PaperNote { note: "second finding".to_string() },
            ],
        );
        let batch = paper_to_record(&paper).unwrap();
        let restored = record_to_paper(&batch, 0).unwrap();
        assert_eq!(restored.url, paper.url);
        assert_eq!(restored.notes, paper.notes);
        assert_eq!(restored.notes[1].note, "second finding");
    }

    #[test]
    fn test_malformed_notes_column_is_rejected() {
        let paper = Paper::new(
            "https://example.com/p.pdf".to_string(),
            "t".to_string(),
            "x".to_string(),
            vec![],
        );
        let batch = paper_to_record(&paper).unwrap();

        // Rebuild the batch with garbage in the notes column.
        let schema = paper_schema();
        let mut cols = batch.columns().to_vec();
        cols[4] = Arc::new(StringArray::from(vec!["not json at all"]));
        let corrupted = RecordBatch::try_new(schema, cols).unwrap();

        let err = record_to_paper(&corrupted, 0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[test]
    fn test_chunk_embedding_round_trip() {
        let mut chunk = Chunk::new(
            "https://example.com/paper.pdf".to_string(),
            0,
            "chunk content".to_string(),
            Some(3),
        );
        chunk.embedding = Some(vec![0.25; EMBEDDING_DIM]);

        let batch = chunk_to_record(&chunk).unwrap();
        let restored = record_to_chunk(&batch, 0).unwrap();
        assert_eq!(restored.paper_url, chunk.paper_url);
        assert_eq!(restored.page, Some(3));
        assert_eq!(restored.embedding.unwrap().len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_chunk_without_embedding_is_null() {
        let chunk = Chunk::new("https://example.com/p.pdf".to_string(), 1, "c".to_string(), None);
        let batch = chunk_to_record(&chunk).unwrap();
        let restored = record_to_chunk(&batch, 0).unwrap();
        assert!(restored.embedding.is_none());
        assert!(restored.page.is_none());
    }

    #[test]
    fn test_qa_record_encodes_followups_as_json() {
        let qa = QaRecord::new(
            "what is the headline result?".to_string(),
            "a 4% improvement".to_string(),
            "chunk context".to_string(),
            vec!["on which benchmark?".to_string()],
        );
        let batch = qa_to_record(&qa).unwrap();
        let col = batch.column(4).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(col.value(0), r#"["on which benchmark?"]"#);
    }
}
