//! LanceDB Vector Store - 청크 저장 및 ANN 검색
//!
//! ANN (Approximate Nearest Neighbor) 검색은 LanceDB가 수행합니다.
//! ref: https://lancedb.github.io/lancedb/

use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::chunk::{ChunkMetadata, DocumentChunk};
use super::vector::{EmbeddedChunk, ScoredChunk, VectorStore, EMBEDDING_DIMENSION};

/// 청크 테이블 이름
const TABLE_NAME: &str = "chunks";

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB 청크 저장소 구현
///
/// Apache Arrow 기반 columnar 저장소로, 메타데이터는 고정 컬럼으로
/// 기록됩니다.
pub struct LanceVectorStore {
    db: Connection,
}

impl LanceVectorStore {
    /// LanceDB 저장소 열기
    ///
    /// # Arguments
    /// * `path` - .lance 디렉토리 경로
    pub async fn open(path: &Path) -> Result<Self> {
        // 부모 디렉토리 생성
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::knowledge_base("Invalid path encoding"))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self { db })
    }

    /// 청크 테이블 스키마 생성
    fn create_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, true),
            Field::new("chunk_index", DataType::Int32, true),
            Field::new("content_type", DataType::Utf8, true),
            Field::new("language", DataType::Utf8, true),
            Field::new("content_preview", DataType::Utf8, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    EMBEDDING_DIMENSION,
                ),
                false,
            ),
        ])
    }

    /// 엔트리들을 Arrow RecordBatch로 변환
    ///
    /// 각 청크에는 이 시점에 저장소 ID(uuid v4)가 부여됩니다.
    fn entries_to_batch(entries: &[EmbeddedChunk]) -> Result<RecordBatch> {
        if entries.is_empty() {
            return Err(Error::knowledge_base("Cannot create batch from empty entries"));
        }

        let ids: Vec<String> = entries
            .iter()
            .map(|e| {
                e.chunk
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string())
            })
            .collect();
        let texts: Vec<&str> = entries.iter().map(|e| e.chunk.text.as_str()).collect();
        let sources: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.chunk.metadata.source.as_deref())
            .collect();
        let chunk_indices: Vec<Option<i32>> =
            entries.iter().map(|e| e.chunk.metadata.chunk_index).collect();
        let content_types: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.chunk.metadata.content_type.as_deref())
            .collect();
        let languages: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.chunk.metadata.language.as_deref())
            .collect();
        let previews: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.chunk.metadata.content_preview.as_deref())
            .collect();

        // 임베딩을 FixedSizeList로 변환
        let embeddings_flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let values = Float32Array::from(embeddings_flat);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings_list = FixedSizeListArray::try_new(
            field,
            EMBEDDING_DIMENSION,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .map_err(|e| Error::knowledge_base(format!("Failed to create embedding array: {}", e)))?;

        let batch = RecordBatch::try_new(
            Arc::new(Self::create_schema()),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from(content_types)),
                Arc::new(StringArray::from(languages)),
                Arc::new(StringArray::from(previews)),
                Arc::new(embeddings_list),
            ],
        )
        .map_err(|e| Error::knowledge_base(format!("Failed to create RecordBatch: {}", e)))?;

        Ok(batch)
    }

    /// 테이블 존재 여부 확인
    async fn table_exists(&self) -> bool {
        self.db
            .table_names()
            .execute()
            .await
            .map(|names| names.contains(&TABLE_NAME.to_string()))
            .unwrap_or(false)
    }
}

/// nullable Utf8 컬럼 값 추출
fn optional_str(array: &StringArray, row: usize) -> Option<String> {
    if array.is_null(row) {
        None
    } else {
        Some(array.value(row).to_string())
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn add(&self, entries: &[EmbeddedChunk]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = Self::entries_to_batch(entries)?;
        let schema = batch.schema();

        if self.table_exists().await {
            // 기존 테이블에 추가
            let table = self
                .db
                .open_table(TABLE_NAME)
                .execute()
                .await
                .map_err(|e| Error::knowledge_base(format!("Failed to open table: {}", e)))?;

            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
            table
                .add(batches)
                .execute()
                .await
                .map_err(|e| Error::knowledge_base(format!("Failed to add chunks: {}", e)))?;
        } else {
            // 새 테이블 생성
            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
            self.db
                .create_table(TABLE_NAME, batches)
                .execute()
                .await
                .map_err(|e| Error::knowledge_base(format!("Failed to create table: {}", e)))?;
        }

        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        if !self.table_exists().await {
            return Ok(vec![]);
        }

        let table = self
            .db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to open table: {}", e)))?;

        let results = table
            .vector_search(query_embedding.to_vec())
            .map_err(|e| Error::knowledge_base(format!("Failed to create vector search: {}", e)))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to execute search: {}", e)))?;

        let mut scored = Vec::new();

        // RecordBatch 스트림에서 결과 추출
        use futures::TryStreamExt;
        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to read search results: {}", e)))?;

        for batch in batches {
            let ids = string_column(&batch, "id")?;
            let texts = string_column(&batch, "text")?;
            let sources = string_column(&batch, "source")?;
            let content_types = string_column(&batch, "content_type")?;
            let languages = string_column(&batch, "language")?;
            let previews = string_column(&batch, "content_preview")?;

            let chunk_indices = batch
                .column_by_name("chunk_index")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| Error::knowledge_base("Missing chunk_index column"))?;

            // _distance 컬럼 (LanceDB가 자동 추가)
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::knowledge_base("Missing _distance column"))?;

            for i in 0..batch.num_rows() {
                let distance = distances.value(i);
                // 거리를 유사도로 변환 (L2 거리 -> 코사인 유사도 근사)
                let similarity = 1.0 / (1.0 + distance);

                let metadata = ChunkMetadata {
                    source: optional_str(sources, i),
                    chunk_index: if chunk_indices.is_null(i) {
                        None
                    } else {
                        Some(chunk_indices.value(i))
                    },
                    content_type: optional_str(content_types, i),
                    language: optional_str(languages, i),
                    content_preview: optional_str(previews, i),
                };

                scored.push(ScoredChunk {
                    chunk: DocumentChunk {
                        id: Some(ids.value(i).to_string()),
                        text: texts.value(i).to_string(),
                        metadata,
                    },
                    similarity,
                });
            }
        }

        // LanceDB는 거리 오름차순으로 반환하므로 유사도 내림차순이 보장되지만
        // 배치 경계를 넘는 경우를 대비해 한 번 더 정렬
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        if !self.table_exists().await {
            return Ok(0);
        }

        let table = self
            .db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to open table: {}", e)))?;

        table
            .count_rows(None)
            .await
            .map_err(|e| Error::knowledge_base(format!("Failed to count rows: {}", e)))
    }
}

/// Utf8 컬럼 추출 헬퍼
fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::knowledge_base(format!("Missing {} column", name)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::chunk::enrich_chunks;
    use tempfile::TempDir;

    fn create_entries(texts: &[&str], source: &str) -> Vec<EmbeddedChunk> {
        let mut chunks: Vec<DocumentChunk> =
            texts.iter().map(|t| DocumentChunk::new(*t)).collect();
        enrich_chunks(&mut chunks, source);

        chunks
            .into_iter()
            .map(|chunk| EmbeddedChunk {
                chunk,
                embedding: vec![0.1; EMBEDDING_DIMENSION as usize],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_lance_store_add_and_count() {
        let temp_dir = TempDir::new().unwrap();
        let lance_path = temp_dir.path().join("test.lance");

        let store = LanceVectorStore::open(&lance_path).await.unwrap();

        // 초기 상태
        assert_eq!(store.count().await.unwrap(), 0);

        let entries = create_entries(&["chunk one", "chunk two"], "doc.pdf");
        let inserted = store.add(&entries).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        // 재저장은 추가만 함 (중복 제거 없음)
        store.add(&entries).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_lance_search_returns_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let lance_path = temp_dir.path().join("search.lance");

        let store = LanceVectorStore::open(&lance_path).await.unwrap();

        let entries = create_entries(&["data classes in kotlin", "coroutines basics"], "doc.pdf");
        store.add(&entries).await.unwrap();

        let query = vec![0.1; EMBEDDING_DIMENSION as usize];
        let results = store.search(&query, 2).await.unwrap();

        assert!(!results.is_empty());
        assert!(results.len() <= 2);

        let first = &results[0];
        assert!(first.chunk.id.is_some());
        assert_eq!(first.chunk.metadata.source.as_deref(), Some("doc.pdf"));
        assert_eq!(
            first.chunk.metadata.content_type.as_deref(),
            Some("kotlin_documentation")
        );

        // 유사도 내림차순 확인
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn test_lance_search_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let lance_path = temp_dir.path().join("empty.lance");

        let store = LanceVectorStore::open(&lance_path).await.unwrap();

        let query = vec![0.1; EMBEDDING_DIMENSION as usize];
        let results = store.search(&query, 5).await.unwrap();
        assert!(results.is_empty());
    }
}
