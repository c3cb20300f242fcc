//! Vector Store - 벡터 저장소 트레이트
//!
//! 벡터 인덱싱과 ANN 검색은 외부 저장소(LanceDB)에 위임합니다.
//! 이 모듈은 저장/검색 인터페이스만 정의합니다.

use async_trait::async_trait;

use crate::error::Result;

use super::chunk::DocumentChunk;

/// 벡터 임베딩 차원 (Gemini gemini-embedding-001 기본값)
/// source: https://ai.google.dev/gemini-api/docs/embeddings
pub const EMBEDDING_DIMENSION: i32 = 768;

// ============================================================================
// Types
// ============================================================================

/// 임베딩이 부여된 청크 (저장용)
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// 문서 청크
    pub chunk: DocumentChunk,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 유사도 검색 결과
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// 검색된 청크
    pub chunk: DocumentChunk,
    /// 유사도 스코어 (0.0 ~ 1.0, 높을수록 유사)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// 벡터 저장소 트레이트 (async)
///
/// 청크는 기록 후 수정되지 않으며, 삭제는 외부 저장소 관리 작업으로만
/// 이루어집니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 청크 배치 저장 (저장된 개수 반환)
    async fn add(&self, entries: &[EmbeddedChunk]) -> Result<usize>;

    /// 유사도 검색 - 유사도 내림차순으로 최대 limit개 반환
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    /// 저장된 청크 개수
    async fn count(&self) -> Result<usize>;
}
