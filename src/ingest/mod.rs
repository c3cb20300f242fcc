//! 인제스트 파이프라인 모듈
//!
//! 문서 읽기 -> 청킹 -> 메타데이터 부여 -> 배치 단위 벡터 저장소 기록의
//! 순차 파이프라인입니다. 실패 시 전체 작업을 중단하지만 이미 기록된
//! 배치는 저장소에 남습니다 (롤백 없음).

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::extractor::DocumentResource;
use crate::knowledge::{
    enrich_chunks, token_chunker, Chunker, ChunkerConfig, DocumentChunk, EmbeddedChunk,
    VectorStore,
};

// ============================================================================
// ProcessingResult
// ============================================================================

/// 인제스트 결과
///
/// 성공과 실패는 상호 배타적입니다 - 성공 결과는 에러 메시지를,
/// 실패 결과는 처리 통계를 가질 수 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    /// 인제스트 성공
    Success {
        /// 처리한 문서(페이지) 수
        documents_processed: usize,
        /// 생성한 청크 수
        chunks_created: usize,
        /// 소요 시간 (ms)
        processing_time_ms: u64,
    },
    /// 인제스트 실패 (이미 기록된 배치는 저장소에 남음)
    Failure {
        /// 실패까지의 소요 시간 (ms)
        processing_time_ms: u64,
        /// 실패 사유
        message: String,
    },
}

impl ProcessingResult {
    /// 성공 여부
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ============================================================================
// IngestionPipeline
// ============================================================================

/// 문서 인제스트 파이프라인
///
/// 협력자(청커, 임베더, 벡터 저장소)는 생성자로 주입받습니다.
pub struct IngestionPipeline {
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl IngestionPipeline {
    /// 파이프라인 생성
    pub fn new(
        chunker: Box<dyn Chunker>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// 설정으로 파이프라인 생성
    pub fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let chunker = token_chunker(ChunkerConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_chunk_size: config.min_chunk_size,
            max_chunk_size: config.max_chunk_size,
        });

        Self::new(chunker, embedder, store, config.batch_size)
    }

    /// 문서 인제스트 수행
    ///
    /// 어떤 단계에서 실패하든 전체 작업이 중단되고, 소요 시간과 메시지를
    /// 담은 Failure가 반환됩니다.
    pub async fn ingest(&self, resource: &DocumentResource) -> ProcessingResult {
        let start = Instant::now();

        tracing::info!("Starting document processing for resource: {}", resource.name());

        match self.run(resource).await {
            Ok((documents_processed, chunks_created)) => {
                let processing_time_ms = start.elapsed().as_millis() as u64;
                tracing::info!(
                    "Successfully processed document. Total chunks: {}, Processing time: {}ms",
                    chunks_created,
                    processing_time_ms
                );

                ProcessingResult::Success {
                    documents_processed,
                    chunks_created,
                    processing_time_ms,
                }
            }
            Err(e) => {
                let processing_time_ms = start.elapsed().as_millis() as u64;
                tracing::error!("Error processing document: {}", e);

                ProcessingResult::Failure {
                    processing_time_ms,
                    message: e.to_string(),
                }
            }
        }
    }

    /// 파이프라인 본체 - (페이지 수, 청크 수) 반환
    async fn run(&self, resource: &DocumentResource) -> Result<(usize, usize)> {
        // 1. 페이지 텍스트 추출
        let pages = resource.extract_pages().await?;
        tracing::info!("Read {} pages from document", pages.len());

        // 2. 청킹
        let texts = self.chunker.chunk_all(&pages);

        // 3. 메타데이터 부여
        let mut chunks: Vec<DocumentChunk> =
            texts.into_iter().map(DocumentChunk::new).collect();
        enrich_chunks(&mut chunks, &resource.name());

        let total_chunks = chunks.len();
        tracing::info!("Created {} chunks from document content", total_chunks);

        // 4. 배치 단위 순차 기록 (순서 보존)
        let mut processed_chunks = 0;

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let start_index = batch_index * self.batch_size + 1;
            let end_index = start_index + batch.len() - 1;
            tracing::info!(
                "Processing batch {}-{} of {} chunks",
                start_index,
                end_index,
                total_chunks
            );

            let batch_texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&batch_texts).await?;

            let entries: Vec<EmbeddedChunk> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
                .collect();

            self.store.add(&entries).await?;

            processed_chunks += batch.len();
            tracing::debug!("Processed {} chunks so far", processed_chunks);
        }

        Ok((pages.len(), processed_chunks))
    }
}

// ============================================================================
// Startup Auto-Loader
// ============================================================================

/// 부팅 시 기본 문서 자동 적재
///
/// 파일이 없으면 경고만 남기고 계속 진행합니다. 코어 로직이 아닌
/// 오케스트레이션 편의 기능입니다.
pub async fn load_default_document(pipeline: &IngestionPipeline, path: &Path) {
    tracing::info!("Attempting to load default documentation from: {}", path.display());

    let resource = DocumentResource::new(path);
    if !resource.exists() {
        tracing::warn!(
            "Default document not found at: {}. Please ingest a documentation file manually.",
            path.display()
        );
        return;
    }

    match pipeline.ingest(&resource).await {
        ProcessingResult::Success {
            documents_processed,
            chunks_created,
            processing_time_ms,
        } => {
            tracing::info!(
                "Successfully loaded default documentation! Documents: {}, Chunks: {}, Time: {}ms",
                documents_processed,
                chunks_created,
                processing_time_ms
            );
        }
        ProcessingResult::Failure { message, .. } => {
            tracing::error!("Failed to process default documentation: {}", message);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::knowledge::ScoredChunk;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 배치 쓰기 호출을 기록하는 목 저장소
    struct RecordingStore {
        batches: Mutex<Vec<usize>>,
        fail_after: Option<usize>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_after: None,
            }
        }

        fn failing_after(calls: usize) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_after: Some(calls),
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn add(&self, entries: &[EmbeddedChunk]) -> Result<usize> {
            let mut batches = self.batches.lock().unwrap();
            if let Some(limit) = self.fail_after {
                if batches.len() >= limit {
                    return Err(Error::knowledge_base("store write failed"));
                }
            }
            batches.push(entries.len());
            Ok(entries.len())
        }

        async fn search(&self, _query: &[f32], _limit: usize) -> Result<Vec<ScoredChunk>> {
            Ok(vec![])
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.batches.lock().unwrap().iter().sum())
        }
    }

    /// 고정 벡터를 반환하는 목 임베더
    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        fn dimension(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// 48단어짜리 텍스트 문서 생성 (텍스트 파일은 페이지 1개로 취급)
    fn write_word_doc(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("doc.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..48 {
            write!(file, "word{} ", i).unwrap();
        }
        path
    }

    fn pipeline_with(
        store: Arc<RecordingStore>,
        chunk_size: usize,
        batch_size: usize,
    ) -> IngestionPipeline {
        let chunker = token_chunker(ChunkerConfig {
            chunk_size,
            chunk_overlap: 0,
            min_chunk_size: 1,
            max_chunk_size: 10_000,
        });
        IngestionPipeline::new(chunker, Arc::new(FixedEmbedder), store, batch_size)
    }

    #[tokio::test]
    async fn test_ingest_single_batch() {
        let dir = TempDir::new().unwrap();
        let path = write_word_doc(&dir);

        // 48단어 / 4단어 청크 = 12청크, 배치 크기 50 -> 쓰기 1회
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline_with(store.clone(), 4, 50);

        let result = pipeline.ingest(&DocumentResource::new(&path)).await;

        match result {
            ProcessingResult::Success {
                documents_processed,
                chunks_created,
                ..
            } => {
                assert_eq!(documents_processed, 1);
                assert_eq!(chunks_created, 12);
            }
            ProcessingResult::Failure { message, .. } => panic!("ingest failed: {}", message),
        }

        assert_eq!(store.batch_sizes(), vec![12]);
    }

    #[tokio::test]
    async fn test_ingest_multiple_batches_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_word_doc(&dir);

        // 12청크, 배치 크기 5 -> 5, 5, 2
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline_with(store.clone(), 4, 5);

        let result = pipeline.ingest(&DocumentResource::new(&path)).await;
        assert!(result.is_successful());
        assert_eq!(store.batch_sizes(), vec![5, 5, 2]);
    }

    #[tokio::test]
    async fn test_ingest_failure_keeps_written_batches() {
        let dir = TempDir::new().unwrap();
        let path = write_word_doc(&dir);

        // 두 번째 배치 쓰기에서 실패 - 첫 배치는 저장소에 남음
        let store = Arc::new(RecordingStore::failing_after(1));
        let pipeline = pipeline_with(store.clone(), 4, 5);

        let result = pipeline.ingest(&DocumentResource::new(&path)).await;

        match result {
            ProcessingResult::Failure { message, .. } => {
                assert!(message.contains("store write failed"));
            }
            ProcessingResult::Success { .. } => panic!("expected failure"),
        }

        assert_eq!(store.batch_sizes(), vec![5]);
    }

    #[tokio::test]
    async fn test_ingest_missing_document() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline_with(store.clone(), 4, 50);

        let result = pipeline
            .ingest(&DocumentResource::new("/nonexistent/doc.pdf"))
            .await;

        assert!(!result.is_successful());
        // 저장소 호출이 없어야 함
        assert!(store.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_load_default_document_missing_is_noop() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline_with(store.clone(), 4, 50);

        // 파일이 없어도 패닉/에러 없이 통과
        load_default_document(&pipeline, Path::new("/nonexistent/kotlin-docs.pdf")).await;
        assert!(store.batch_sizes().is_empty());
    }
}
