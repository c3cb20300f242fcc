//! 언어 모델 모듈 - Gemini API를 통한 답변 생성
//!
//! 프롬프트를 받아 텍스트를 생성하는 언어 모델 인터페이스입니다.
//! 모델 추론은 전적으로 외부 API에 위임하며, 실패는 재시도 없이
//! 즉시 에러로 반환됩니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedding::get_api_key;
use crate::error::{Error, Result};

// ============================================================================
// ChatModel Trait
// ============================================================================

/// 언어 모델 트레이트
///
/// 완성된 프롬프트를 동기식(요청-응답)으로 호출합니다.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 프롬프트로 텍스트 생성 (모델이 내용을 반환하지 않으면 빈 문자열)
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// 모델 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Google Gemini Chat
// ============================================================================

/// 기본 생성 모델
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// 생성 API 베이스 URL
/// source: https://ai.google.dev/gemini-api/docs/text-generation
const GEMINI_GENERATE_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini 생성 모델 구현체
#[derive(Debug)]
pub struct GeminiChat {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

impl GeminiChat {
    /// 새 Gemini 생성 인스턴스 생성
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// 모델을 지정하여 생성
    pub fn with_model(api_key: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            api_key,
            client,
            model,
        })
    }

    /// 환경변수에서 API 키를 읽어 생성
    ///
    /// 우선순위: GEMINI_API_KEY > GOOGLE_AI_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key()?;
        Self::new(api_key)
    }

    /// 생성 API 엔드포인트
    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_GENERATE_BASE, self.model)
    }
}

/// Gemini 생성 API 요청 본문
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini 생성 API 응답
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("Failed to send generation request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "Gemini generation failed ({}): {}",
                status, body
            )));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse generation response: {}", e)))?;

        // 모델이 내용을 반환하지 않으면 빈 문자열
        let answer = gen_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        tracing::debug!("Generated answer with {} characters", answer.len());

        Ok(answer)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
