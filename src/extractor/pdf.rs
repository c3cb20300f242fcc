//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 페이지 단위 텍스트를 추출합니다.

use std::path::Path;

use crate::error::{Error, Result};

/// PDF에서 페이지 단위 텍스트 추출
///
/// 페이지 순서대로 텍스트를 반환합니다. 페이지 분리에 실패하면
/// 전체 텍스트를 한 페이지로 반환합니다.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    // PDF 파일 읽기
    let bytes = std::fs::read(path)
        .map_err(|e| Error::document_read(format!("Failed to read PDF {}: {}", path.display(), e)))?;

    // 전체 텍스트 추출
    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        Error::document_read(format!(
            "Failed to extract text from PDF {}: {}",
            path.display(),
            e
        ))
    })?;

    // 텍스트가 비어있으면 경고 (스캔본 가능성)
    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {}. It might be a scanned document.",
            path.display()
        );
        return Ok(vec![String::new()]);
    }

    Ok(split_pdf_pages(&text))
}

/// PDF 텍스트를 페이지별로 분리
fn split_pdf_pages(text: &str) -> Vec<String> {
    // 폼피드 문자 (\x0c)로 페이지 분리 시도
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.len() > 1 {
        return pages;
    }

    // 페이지 구분자 패턴으로 시도 (일부 PDF에서 사용)
    // 예: "--- Page 1 ---" 또는 "=== 1 ==="
    let page_pattern = regex::Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
        .expect("Invalid regex");

    if page_pattern.is_match(text) {
        let pages: Vec<String> = page_pattern
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    // 분리 실패 - 전체를 하나의 페이지로
    vec![text.to_string()]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pdf_pages_with_formfeed() {
        let text = "Page 1 content\x0cPage 2 content\x0cPage 3 content";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], "Page 1 content");
        assert_eq!(pages[1], "Page 2 content");
    }

    #[test]
    fn test_split_pdf_pages_with_separator_lines() {
        let text = "Intro text\n--- Page 1 ---\nBody text\n--- Page 2 ---\nMore text";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn test_split_pdf_pages_no_separator() {
        let text = "Just some text without page breaks";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0], text);
    }
}
