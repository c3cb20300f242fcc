//! kodoc-rag - Kotlin 문서 RAG 챗봇
//!
//! LanceDB 벡터 검색 + Gemini 답변 생성을 결합한
//! Kotlin 문서 질의응답 시스템입니다.

pub mod chatbot;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod server;

// Re-exports
pub use chatbot::{ChatReply, ChatbotService, Confidence};
pub use config::AppConfig;
pub use embedding::{get_api_key, has_api_key, EmbeddingProvider, GeminiEmbedding};
pub use error::{Error, Result};
pub use extractor::DocumentResource;
pub use ingest::{IngestionPipeline, ProcessingResult};
pub use knowledge::{
    default_chunker, token_chunker, Chunker, ChunkerConfig, DocumentChunk, EmbeddedChunk,
    LanceVectorStore, ScoredChunk, VectorStore,
};
pub use llm::{ChatModel, GeminiChat};
