//! 설정 모듈
//!
//! 파이프라인의 모든 설정 값을 한곳에서 관리합니다.
//! 기본값 + `KODOC_*` 환경변수 override 방식입니다.

use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// 청크 당 토큰 수 기본값
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// 청크 간 오버랩 토큰 수 기본값
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// 최소 청크 크기 (토큰)
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 5;
/// 최대 청크 크기 (토큰)
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10_000;
/// 벡터 저장소 쓰기 배치 크기 기본값
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// 컨텍스트에 포함할 최대 문서 수 기본값
pub const DEFAULT_MAX_CONTEXT_DOCUMENTS: usize = 5;
/// 유사도 임계값 기본값
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// 데이터 디렉토리 경로 (~/.kodoc-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kodoc-rag")
}

// ============================================================================
// AppConfig
// ============================================================================

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 청크 당 토큰 수
    pub chunk_size: usize,
    /// 청크 간 오버랩 토큰 수
    pub chunk_overlap: usize,
    /// 최소 청크 크기 (이보다 작으면 이웃 청크와 병합)
    pub min_chunk_size: usize,
    /// 최대 청크 크기 (초과분은 잘림)
    pub max_chunk_size: usize,
    /// 벡터 저장소 쓰기 배치 크기
    pub batch_size: usize,
    /// 컨텍스트에 포함할 최대 문서 수 (top-K)
    pub max_context_documents: usize,
    /// 검색 결과 유사도 임계값
    pub similarity_threshold: f32,
    /// HTTP 서버 호스트
    pub server_host: String,
    /// HTTP 서버 포트
    pub server_port: u16,
    /// 부팅 시 기본 문서 자동 적재 여부
    pub auto_load_default_document: bool,
    /// 기본 문서 경로
    pub default_document_path: PathBuf,
    /// LanceDB 데이터 디렉토리
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_context_documents: DEFAULT_MAX_CONTEXT_DOCUMENTS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            auto_load_default_document: false,
            default_document_path: PathBuf::from("kotlin-docs.pdf"),
            data_dir: get_data_dir(),
        }
    }
}

impl AppConfig {
    /// 환경변수에서 설정 로드 (없는 값은 기본값 유지)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("KODOC_CHUNK_SIZE") {
            config.chunk_size = v;
        }
        if let Some(v) = env_parse("KODOC_CHUNK_OVERLAP") {
            config.chunk_overlap = v;
        }
        if let Some(v) = env_parse("KODOC_MIN_CHUNK_SIZE") {
            config.min_chunk_size = v;
        }
        if let Some(v) = env_parse("KODOC_MAX_CHUNK_SIZE") {
            config.max_chunk_size = v;
        }
        if let Some(v) = env_parse("KODOC_BATCH_SIZE") {
            config.batch_size = v;
        }
        if let Some(v) = env_parse("KODOC_MAX_CONTEXT_DOCUMENTS") {
            config.max_context_documents = v;
        }
        if let Some(v) = env_parse::<f32>("KODOC_SIMILARITY_THRESHOLD") {
            config.similarity_threshold = v;
        }
        if let Ok(v) = std::env::var("KODOC_SERVER_HOST") {
            if !v.is_empty() {
                config.server_host = v;
            }
        }
        if let Some(v) = env_parse("KODOC_SERVER_PORT") {
            config.server_port = v;
        }
        if let Some(v) = env_parse("KODOC_AUTO_LOAD_DEFAULT_DOCUMENT") {
            config.auto_load_default_document = v;
        }
        if let Ok(v) = std::env::var("KODOC_DEFAULT_DOCUMENT_PATH") {
            if !v.is_empty() {
                config.default_document_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("KODOC_DATA_DIR") {
            if !v.is_empty() {
                config.data_dir = PathBuf::from(v);
            }
        }

        config
    }
}

/// 환경변수 파싱 (실패 시 None)
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_context_documents, 5);
        assert!((config.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert!(!config.auto_load_default_document);
    }

    #[test]
    fn test_from_env_chunk_size_bounds() {
        std::env::set_var("KODOC_MIN_CHUNK_SIZE", "10");
        std::env::set_var("KODOC_MAX_CHUNK_SIZE", "2000");

        let config = AppConfig::from_env();
        assert_eq!(config.min_chunk_size, 10);
        assert_eq!(config.max_chunk_size, 2000);

        std::env::remove_var("KODOC_MIN_CHUNK_SIZE");
        std::env::remove_var("KODOC_MAX_CHUNK_SIZE");
    }

    #[test]
    fn test_data_dir_suffix() {
        let dir = get_data_dir();
        assert!(dir.ends_with(".kodoc-rag"));
    }
}
