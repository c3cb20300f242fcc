//! 문서 리소스 모듈
//!
//! 인제스트 대상 문서를 읽어 페이지 단위 텍스트로 추출합니다.
//! - PDF 파일: pdf-extract로 페이지별 텍스트 추출
//! - 텍스트 파일: 전체를 한 페이지로 취급

pub mod pdf;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ============================================================================
// DocumentResource
// ============================================================================

/// 인제스트 대상 문서 리소스
///
/// 존재 확인과 페이지 텍스트 추출만 제공합니다. 추출 실패는
/// `DocumentRead` 에러로 반환됩니다.
#[derive(Debug, Clone)]
pub struct DocumentResource {
    path: PathBuf,
}

impl DocumentResource {
    /// 경로로 리소스 생성
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 리소스 존재 여부
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 리소스 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 메타데이터 source로 쓰이는 문서 이름 (파일명)
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// 페이지 단위 텍스트 추출
    ///
    /// PDF는 페이지별로, 그 외 파일은 전체 내용을 한 페이지로 반환합니다.
    pub async fn extract_pages(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Err(Error::document_read(format!(
                "Document not found: {}",
                self.path.display()
            )));
        }

        if is_pdf(&self.path) {
            // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
            let path = self.path.clone();
            let pages = tokio::task::spawn_blocking(move || pdf::extract_pdf_pages(&path))
                .await
                .map_err(|e| Error::document_read(format!("PDF extraction task failed: {}", e)))??;

            Ok(pages)
        } else {
            let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                Error::document_read(format!(
                    "Failed to read text file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

            Ok(vec![text])
        }
    }
}

/// 확장자 기준 PDF 여부 판별
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("kotlin-docs.pdf")));
        assert!(is_pdf(Path::new("KOTLIN-DOCS.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("no-extension")));
    }

    #[test]
    fn test_resource_name() {
        let resource = DocumentResource::new("/some/dir/kotlin-docs.pdf");
        assert_eq!(resource.name(), "kotlin-docs.pdf");
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let resource = DocumentResource::new("/nonexistent/file.pdf");
        assert!(!resource.exists());

        let result = resource.extract_pages().await;
        assert!(matches!(result, Err(Error::DocumentRead(_))));
    }

    #[tokio::test]
    async fn test_text_file_is_single_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Kotlin data classes").unwrap();

        let resource = DocumentResource::new(&path);
        assert!(resource.exists());

        let pages = resource.extract_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Kotlin data classes"));
    }
}
