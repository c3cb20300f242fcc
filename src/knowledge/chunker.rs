//! 텍스트 청킹 모듈
//!
//! 추출된 문서 텍스트를 토큰(공백 기준 단어) 단위의 오버랩 청크로 분할합니다.
//! 경계를 넘는 문맥 보존을 위해 연속 청크는 설정된 토큰 수만큼 겹칩니다.

use crate::config::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE,
};

// ============================================================================
// Chunker Configuration
// ============================================================================

/// 청킹 설정 (모든 값은 토큰 수)
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// 청크 당 목표 토큰 수
    pub chunk_size: usize,
    /// 연속 청크 간 오버랩 토큰 수
    pub chunk_overlap: usize,
    /// 최소 청크 크기 (미만이면 이전 청크에 흡수)
    pub min_chunk_size: usize,
    /// 최대 청크 크기
    pub max_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 여러 세그먼트(페이지)를 순서대로 분할하여 이어 붙임
    fn chunk_all(&self, segments: &[String]) -> Vec<String> {
        segments.iter().flat_map(|s| self.chunk(s)).collect()
    }

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// TokenChunker
// ============================================================================

/// 토큰 윈도우 청커
///
/// 순수 함수입니다 - 동일 입력과 설정에 대해 항상 동일한 결과를 반환하며
/// 부수 효과가 없습니다.
pub struct TokenChunker {
    config: ChunkerConfig,
}

impl TokenChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl Chunker for TokenChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return vec![];
        }

        // 목표 크기는 최대 크기를 넘을 수 없음
        let size = self.config.chunk_size.min(self.config.max_chunk_size).max(1);

        if words.len() <= size {
            return vec![words.join(" ")];
        }

        // 오버랩이 크기 이상이면 진행이 불가능하므로 최소 1 토큰씩 전진
        let step = size.saturating_sub(self.config.chunk_overlap).max(1);

        // 꼬리 흡수 상한 - 최대 크기가 size + min보다 작으면 흡수가 중간에
        // 잘려 min 미만 꼬리 청크가 남으므로, 흡수 시에만 상한을 보정
        let absorb_cap = self
            .config
            .max_chunk_size
            .max(size + self.config.min_chunk_size);

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let mut end = (start + size).min(words.len());
            let next_start = start + step;

            // 남은 꼬리가 최소 크기 미만의 청크를 만들게 되면 현재 청크에 흡수
            if end < words.len() {
                let tail = words.len().saturating_sub(next_start);
                if tail < self.config.min_chunk_size {
                    end = words.len().min(start + absorb_cap);
                }
            }

            chunks.push(words[start..end].join(" "));

            if end >= words.len() {
                break;
            }
            start = next_start;
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "TokenChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(TokenChunker::with_defaults())
}

/// 토큰 청커 생성 (설정 지정)
pub fn token_chunker(config: ChunkerConfig) -> Box<dyn Chunker> {
    Box::new(TokenChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize, min: usize, max: usize) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_chunk_size: min,
            max_chunk_size: max,
        }
    }

    #[test]
    fn test_chunker_empty() {
        let chunker = TokenChunker::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n  ").is_empty());
    }

    #[test]
    fn test_chunker_small_text() {
        let chunker = TokenChunker::with_defaults();
        let chunks = chunker.chunk("data classes hold immutable state");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "data classes hold immutable state");
    }

    #[test]
    fn test_chunker_overlap() {
        let chunker = TokenChunker::new(config(4, 1, 1, 100));
        let chunks = chunker.chunk("a b c d e f g h i j");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "a b c d");
        assert_eq!(chunks[1], "d e f g");
        assert_eq!(chunks[2], "g h i j");
    }

    #[test]
    fn test_chunker_no_overlap() {
        let chunker = TokenChunker::new(config(4, 0, 1, 100));
        let chunks = chunker.chunk("a b c d e f g h");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a b c d");
        assert_eq!(chunks[1], "e f g h");
    }

    #[test]
    fn test_chunker_absorbs_tiny_tail() {
        // 9 단어, 크기 4, step 4 - 마지막 1단어 청크는 이전 청크에 흡수
        let chunker = TokenChunker::new(config(4, 0, 2, 100));
        let chunks = chunker.chunk("a b c d e f g h i");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a b c d");
        assert_eq!(chunks[1], "e f g h i");
    }

    #[test]
    fn test_chunker_absorbs_tail_with_tight_max() {
        // max(4)가 size(4) + min(3)보다 작아도 min 미만 꼬리가 남지 않아야 함
        let chunker = TokenChunker::new(config(4, 0, 3, 4));
        let chunks = chunker.chunk("a b c d e f g h i");

        assert_eq!(chunks, vec!["a b c d", "e f g h i"]);
        for chunk in &chunks {
            assert!(chunk.split_whitespace().count() >= 3);
        }
    }

    #[test]
    fn test_chunker_respects_max_size() {
        let chunker = TokenChunker::new(config(10, 0, 1, 6));
        let chunks = chunker.chunk("a b c d e f g h i j k l");

        for chunk in &chunks {
            assert!(chunk.split_whitespace().count() <= 6);
        }
    }

    #[test]
    fn test_chunker_deterministic() {
        let chunker = TokenChunker::new(config(5, 2, 2, 100));
        let text = "the quick brown fox jumps over the lazy dog again and again";

        let first = chunker.chunk(text);
        let second = chunker.chunk(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_all_preserves_order() {
        let chunker = TokenChunker::new(config(3, 0, 1, 100));
        let pages = vec!["a b c d".to_string(), "e f".to_string()];

        let chunks = chunker.chunk_all(&pages);
        assert_eq!(chunks, vec!["a b c", "d", "e f"]);
    }
}
