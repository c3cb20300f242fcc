//! 에러 타입 모듈
//!
//! 파이프라인 전체에서 사용하는 에러 분류입니다.
//! 사용자에게는 안전한 메시지만 반환하고, 원본 에러는 로그에만 남깁니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 챗봇 공통 Result 타입
pub type Result<T> = std::result::Result<T, Error>;

/// RAG 챗봇 에러 분류
#[derive(Debug, Error)]
pub enum Error {
    /// 잘못된 입력 (사용자가 수정 가능)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 벡터 저장소 연결 실패 또는 설정 오류
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// 문서를 읽거나 파싱할 수 없음
    #[error("Document read error: {0}")]
    DocumentRead(String),

    /// 임베딩 생성 실패
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// 언어 모델 호출 실패
    #[error("Generation error: {0}")]
    Generation(String),

    /// 분류되지 않은 내부 에러
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO 에러
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP 클라이언트 에러
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Validation 에러 생성
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// KnowledgeBase 에러 생성
    pub fn knowledge_base(message: impl Into<String>) -> Self {
        Self::KnowledgeBase(message.into())
    }

    /// DocumentRead 에러 생성
    pub fn document_read(message: impl Into<String>) -> Self {
        Self::DocumentRead(message.into())
    }

    /// Generation 에러 생성
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Internal 에러 생성
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // 원본 에러는 여기서만 로그에 남김
        tracing::error!("Request failed: {}", self);

        let (status, message) = match &self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::KnowledgeBase(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "There was an issue with the knowledge base. Please try again later.".to_string(),
            ),
            Error::DocumentRead(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Error processing document: {}", msg),
            ),
            Error::Embedding(_) | Error::Generation(_) | Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred. Please try again later.".to_string(),
            ),
            Error::Io(_) | Error::Http(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred. Please try again later.".to_string(),
            ),
        };

        let body = Json(json!({
            "successful": false,
            "errorMessage": message,
        }));

        (status, body).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("Question cannot be empty");
        assert_eq!(err.to_string(), "Validation error: Question cannot be empty");

        let err = Error::knowledge_base("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (Error::knowledge_base("down"), StatusCode::SERVICE_UNAVAILABLE),
            (Error::document_read("broken pdf"), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::generation("model down"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
