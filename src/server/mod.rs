//! HTTP 서버 모듈
//!
//! 챗봇 쿼리 파이프라인을 REST API로 노출합니다. 요청 형식 검증은 이
//! 계층에서, 도메인 흐름(컨텍스트 미발견 등)은 서비스 계층에서 처리합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chatbot::{ChatReply, ChatbotService, Confidence};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::knowledge::VectorStore;

/// 질문 최대 길이 (문자)
const MAX_QUESTION_CHARS: usize = 1000;

// ============================================================================
// State
// ============================================================================

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    chatbot: Arc<ChatbotService>,
    store: Arc<dyn VectorStore>,
}

impl AppState {
    pub fn new(chatbot: Arc<ChatbotService>, store: Arc<dyn VectorStore>) -> Self {
        Self { chatbot, store }
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// 챗봇 응답 와이어 형식
///
/// 성공이면 answer 계열 필드만, 실패면 errorMessage만 직렬화됩니다.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AskResponse {
    Success {
        answer: String,
        confidence: Confidence,
        #[serde(rename = "contextDocumentCount")]
        context_document_count: usize,
        #[serde(rename = "responseTimeMs")]
        response_time_ms: u64,
        successful: bool,
    },
    Failure {
        #[serde(rename = "errorMessage")]
        error_message: String,
        successful: bool,
    },
}

impl From<ChatReply> for AskResponse {
    fn from(reply: ChatReply) -> Self {
        match reply {
            ChatReply::Success {
                answer,
                confidence,
                context_documents,
                response_time_ms,
            } => Self::Success {
                answer,
                confidence,
                context_document_count: context_documents,
                response_time_ms,
                successful: true,
            },
            ChatReply::Failure { message } => Self::Failure {
                error_message: message,
                successful: false,
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 질문 형식 검증 - 형식 오류는 서비스 호출 전에 거릅니다.
fn validate_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(Error::validation("Question cannot be empty"));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(Error::validation(
            "Question must be less than 1000 characters",
        ));
    }
    Ok(())
}

fn reply_response(reply: ChatReply) -> Response {
    let status = if reply.is_successful() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(AskResponse::from(reply))).into_response()
}

/// POST /api/kotlin-chatbot/ask
async fn ask_post(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Response> {
    validate_question(&request.question)?;
    let reply = state.chatbot.ask(&request.question).await;
    Ok(reply_response(reply))
}

/// GET /api/kotlin-chatbot/ask?question=...
async fn ask_get(
    State(state): State<AppState>,
    Query(request): Query<AskRequest>,
) -> Result<Response> {
    validate_question(&request.question)?;
    let reply = state.chatbot.ask(&request.question).await;
    Ok(reply_response(reply))
}

/// GET /api/kotlin-chatbot/info
async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Kotlin Expert Chatbot",
        "version": "1.0.0",
        "description": "A specialized AI chatbot for answering Kotlin programming questions using RAG (Retrieval-Augmented Generation)",
        "usage": "Ask me anything about Kotlin programming - syntax, concepts, best practices, and more!"
    }))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    // 저장소 접근 실패여도 프로세스는 살아 있으므로 UP에 -1 집계로 표시
    let chunk_count = match state.store.count().await {
        Ok(count) => count as i64,
        Err(e) => {
            tracing::warn!("Health check could not count chunks: {}", e);
            -1
        }
    };

    Json(json!({
        "status": "UP",
        "chunks": chunk_count
    }))
}

// ============================================================================
// Router / Serve
// ============================================================================

/// 라우터 구성
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/kotlin-chatbot/ask", get(ask_get).post(ask_post))
        .route("/api/kotlin-chatbot/info", get(info))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 서버 기동 - 종료 시그널까지 블로킹
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .map_err(|e| Error::internal(format!("invalid server address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Kotlin chatbot API listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_question() {
        assert!(validate_question("What is a coroutine?").is_ok());
        assert!(matches!(
            validate_question("   "),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_question(&"x".repeat(1001)),
            Err(Error::Validation(_))
        ));
        // 정확히 1000자까지는 허용
        assert!(validate_question(&"x".repeat(1000)).is_ok());
    }

    #[test]
    fn test_ask_response_success_shape() {
        let reply = ChatReply::Success {
            answer: "Use suspend functions.".to_string(),
            confidence: Confidence::High,
            context_documents: 5,
            response_time_ms: 420,
        };

        let value = serde_json::to_value(AskResponse::from(reply)).unwrap();
        assert_eq!(value["answer"], "Use suspend functions.");
        assert_eq!(value["confidence"], "HIGH");
        assert_eq!(value["contextDocumentCount"], 5);
        assert_eq!(value["responseTimeMs"], 420);
        assert_eq!(value["successful"], true);
        assert!(value.get("errorMessage").is_none());
    }

    #[test]
    fn test_ask_response_failure_shape() {
        let reply = ChatReply::Failure {
            message: "Question cannot be empty".to_string(),
        };

        let value = serde_json::to_value(AskResponse::from(reply)).unwrap();
        assert_eq!(value["errorMessage"], "Question cannot be empty");
        assert_eq!(value["successful"], false);
        assert!(value.get("answer").is_none());
    }
}
