//! Knowledge 모듈 - 문서 청크 지식 저장소
//!
//! - Chunk: 문서 청크 타입 + 메타데이터 부여
//! - Chunker: 토큰 윈도우 텍스트 분할
//! - Vector: 벡터 저장소 트레이트
//! - Lance: LanceDB 벡터 검색 (ANN)

mod chunk;
mod chunker;
mod lance;
mod vector;

// Re-exports
pub use chunk::{enrich_chunks, ChunkMetadata, DocumentChunk, CONTENT_TYPE, LANGUAGE};
pub use chunker::{
    default_chunker, token_chunker, Chunker, ChunkerConfig, TokenChunker,
};
pub use lance::LanceVectorStore;
pub use vector::{EmbeddedChunk, ScoredChunk, VectorStore, EMBEDDING_DIMENSION};
