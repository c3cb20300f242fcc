//! 챗봇 서비스 모듈
//!
//! 질문 -> 지식 베이스 검색 -> 컨텍스트 조립 -> 답변 생성 -> 신뢰도 산정의
//! 쿼리 파이프라인입니다. 사용자에게 보이는 실패는 모두 ChatReply::Failure로
//! 수렴하며, 내부 에러 상세는 로그에만 남깁니다.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::knowledge::{ScoredChunk, VectorStore};
use crate::llm::ChatModel;

// ============================================================================
// Prompt
// ============================================================================

/// Kotlin 전문가 프롬프트 템플릿
///
/// {context}와 {question} 슬롯을 런타임에 치환합니다.
const KOTLIN_EXPERT_PROMPT: &str = "\
You are a Kotlin programming expert and tutor. Answer the user's question about Kotlin \
using ONLY the provided documentation context below.

Guidelines:
- Base your answer strictly on the provided context
- If the context does not contain enough information to answer the question, say so clearly
- Include code examples from the context when they are relevant
- Be concise but thorough
- Use proper Kotlin terminology

Documentation context:
{context}

Question: {question}

Answer:";

/// 컨텍스트 미발견 시 사용자 안내 메시지
const NO_CONTEXT_MESSAGE: &str = "I couldn't find relevant information in my Kotlin \
knowledge base. Please ask questions related to Kotlin programming, or ensure the \
knowledge base is properly loaded.";

/// 내부 에러 시 사용자 안내 메시지
const INTERNAL_ERROR_MESSAGE: &str =
    "I encountered an error while processing your question. Please try again.";

// ============================================================================
// Confidence
// ============================================================================

/// 답변 신뢰도 등급
///
/// 검색된 청크 수와 답변 길이만으로 산정하는 휴리스틱입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "VERY_LOW")]
    VeryLow,
}

impl Confidence {
    /// 신뢰도 산정 - 위에서부터 첫 번째로 맞는 행 적용
    ///
    /// | 청크 수 | 답변 길이 | 등급     |
    /// |---------|-----------|----------|
    /// | >= 4    | > 300     | HIGH     |
    /// | >= 2    | > 150     | MEDIUM   |
    /// | >= 1    | > 50      | LOW      |
    /// | 그 외   |           | VERY_LOW |
    pub fn score(chunk_count: usize, answer_len: usize) -> Self {
        if chunk_count >= 4 && answer_len > 300 {
            Self::High
        } else if chunk_count >= 2 && answer_len > 150 {
            Self::Medium
        } else if chunk_count >= 1 && answer_len > 50 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    /// 직렬화 표기와 동일한 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::VeryLow => "VERY_LOW",
        }
    }
}

// ============================================================================
// ChatReply
// ============================================================================

/// 챗봇 응답
///
/// 성공 응답에는 에러 메시지가, 실패 응답에는 답변/신뢰도가 존재할 수
/// 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// 답변 생성 성공
    Success {
        answer: String,
        confidence: Confidence,
        context_documents: usize,
        response_time_ms: u64,
    },
    /// 사용자에게 보일 실패
    Failure { message: String },
}

impl ChatReply {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ============================================================================
// Context Assembly
// ============================================================================

/// 검색 결과를 프롬프트 컨텍스트 문자열로 조립
///
/// 각 청크는 출처/섹션 헤더와 본문으로 구성되며, 구분선으로 이어집니다.
/// 입력 순서가 같으면 결과 바이트가 항상 같습니다.
fn assemble_context(chunks: &[ScoredChunk]) -> String {
    let separator = format!("\n{}\n", "=".repeat(50));

    let blocks: Vec<String> = chunks
        .iter()
        .map(|scored| {
            let mut block = String::new();
            if let Some(source) = &scored.chunk.metadata.source {
                block.push_str(&format!("Source: {}\n", source));
            }
            if let Some(index) = scored.chunk.metadata.chunk_index {
                block.push_str(&format!("Section: {}\n", index));
            }
            block.push_str(&scored.chunk.text);
            block.push_str("\n\n");
            block
        })
        .collect();

    blocks.join(&separator)
}

// ============================================================================
// ChatbotService
// ============================================================================

/// RAG 기반 Kotlin 챗봇 서비스
pub struct ChatbotService {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
    max_context_documents: usize,
    similarity_threshold: f32,
}

impl ChatbotService {
    /// 서비스 생성
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
        max_context_documents: usize,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            max_context_documents,
            similarity_threshold,
        }
    }

    /// 설정으로 서비스 생성
    pub fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self::new(
            embedder,
            store,
            model,
            config.max_context_documents,
            config.similarity_threshold,
        )
    }

    /// 질문에 답변
    ///
    /// 빈 질문과 컨텍스트 미발견은 정상 흐름의 Failure이고, 외부 호출
    /// 에러는 로그 후 일반 안내 메시지로 변환됩니다.
    pub async fn ask(&self, question: &str) -> ChatReply {
        let start = Instant::now();

        if question.trim().is_empty() {
            return ChatReply::Failure {
                message: "Question cannot be empty".to_string(),
            };
        }

        tracing::info!("Processing question: {}", question);

        match self.answer(question).await {
            Ok(Some((answer, context_documents))) => {
                let response_time_ms = start.elapsed().as_millis() as u64;
                let confidence = Confidence::score(context_documents, answer.chars().count());
                tracing::info!(
                    "Generated answer with {} context documents, confidence: {}, time: {}ms",
                    context_documents,
                    confidence.as_str(),
                    response_time_ms
                );

                ChatReply::Success {
                    answer,
                    confidence,
                    context_documents,
                    response_time_ms,
                }
            }
            Ok(None) => {
                tracing::info!("No relevant context found for question");
                ChatReply::Failure {
                    message: NO_CONTEXT_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Error processing question: {}", e);
                ChatReply::Failure {
                    message: INTERNAL_ERROR_MESSAGE.to_string(),
                }
            }
        }
    }

    /// 검색 + 생성 본체
    ///
    /// 컨텍스트를 찾지 못하면 Ok(None)을 반환합니다.
    async fn answer(&self, question: &str) -> Result<Option<(String, usize)>> {
        let chunks = self.retrieve(question).await?;
        if chunks.is_empty() {
            return Ok(None);
        }

        let context = assemble_context(&chunks);
        let prompt = KOTLIN_EXPERT_PROMPT
            .replace("{context}", &context)
            .replace("{question}", question);

        let answer = self.model.generate(&prompt).await?;
        Ok(Some((answer, chunks.len())))
    }

    /// 유사도 임계치 이상인 상위 청크 검색
    async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(question).await?;

        let mut results = self
            .store
            .search(&query_embedding, self.max_context_documents)
            .await?;

        results.retain(|scored| scored.similarity >= self.similarity_threshold);
        results.truncate(self.max_context_documents);

        tracing::debug!("Retrieved {} relevant chunks", results.len());
        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================
