//! 문서 청크 타입 및 메타데이터 부여
//!
//! 인제스트 시 생성되는 청크와 출처(provenance) 메타데이터를 정의합니다.
//! 메타데이터는 열린 맵 대신 고정 필드 구조체로 관리합니다.

use serde::{Deserialize, Serialize};

/// 이 코퍼스를 식별하는 content_type 태그
pub const CONTENT_TYPE: &str = "kotlin_documentation";

/// 언어 태그
pub const LANGUAGE: &str = "kotlin";

/// content_preview 최대 문자 수
const PREVIEW_CHARS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// 청크 메타데이터 (고정 필드)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// 원본 문서 이름
    pub source: Option<String>,
    /// 문서 내 청크 위치 (0-based)
    pub chunk_index: Option<i32>,
    /// 코퍼스 식별 태그
    pub content_type: Option<String>,
    /// 언어 태그
    pub language: Option<String>,
    /// 청크 내용 미리보기 (최대 100자)
    pub content_preview: Option<String>,
}

/// 문서 청크 - 저장소의 단일 검색 단위
///
/// 저장소에 기록된 후에는 수정되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// 저장소가 기록 시 부여하는 ID
    pub id: Option<String>,
    /// 청크 텍스트
    pub text: String,
    /// 출처 메타데이터
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// 텍스트만으로 청크 생성 (메타데이터는 인제스트 단계에서 채움)
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            metadata: ChunkMetadata::default(),
        }
    }
}

// ============================================================================
// Metadata Enricher
// ============================================================================

/// 청크 목록에 출처 메타데이터 부여
///
/// source, chunk_index(전체 순서 기준 0-based), content_type, language,
/// content_preview를 각 청크에 채워 넣습니다. 외부 I/O 없음.
pub fn enrich_chunks(chunks: &mut [DocumentChunk], source: &str) {
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.source = Some(source.to_string());
        chunk.metadata.chunk_index = Some(index as i32);
        chunk.metadata.content_type = Some(CONTENT_TYPE.to_string());
        chunk.metadata.language = Some(LANGUAGE.to_string());
        chunk.metadata.content_preview = Some(content_preview(&chunk.text));
    }
}

/// 청크 내용 미리보기 생성
///
/// 100자 초과 시 앞 100자 + "...", 이하면 전체 텍스트.
/// 문자 단위로 자르므로 UTF-8 경계가 깨지지 않습니다.
fn content_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
