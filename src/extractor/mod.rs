//! 콘텐츠 추출 모듈
//!
//! 파일 형식별로 텍스트 콘텐츠를 추출합니다.
//! - 텍스트 파일: 엄격한 UTF-8 디코딩 (실패 시 파일 단위 오류)
//! - PDF 파일: pdf-extract로 텍스트 추출
//!
//! 모든 실패는 `IngestError`로 보고되어 해당 파일에만 국한됩니다.

pub mod pdf;

use std::path::Path;

use crate::collector::FileType;
use crate::knowledge::IngestError;

/// 파일에서 텍스트 추출
pub async fn extract_file(path: &Path, file_type: FileType) -> Result<String, IngestError> {
    match file_type {
        FileType::Text => extract_text(path).await,
        FileType::Pdf => extract_pdf(path).await,
    }
}

/// 텍스트 파일 디코딩
///
/// UTF-8이 아닌 바이트는 디코딩 오류로 보고합니다 (손실 변환 없음).
async fn extract_text(path: &Path) -> Result<String, IngestError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| IngestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let name = file_name(path);
    let text = std::str::from_utf8(&bytes).map_err(|e| IngestError::Decode { name, source: e })?;

    Ok(text.to_string())
}

/// PDF 파일 텍스트 추출
async fn extract_pdf(path: &Path) -> Result<String, IngestError> {
    // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
    let owned = path.to_path_buf();
    let name = file_name(path);

    let result = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&owned))
        .await
        .map_err(|e| IngestError::Pdf {
            name: name.clone(),
            message: format!("extraction task failed: {}", e),
        })?;

    result
}

/// 파일 이름 표시용 문자열
fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_extract_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello extractor").unwrap();

        let text = extract_file(&path, FileType::Text).await.unwrap();
        assert_eq!(text, "hello extractor");
    }

    #[tokio::test]
    async fn test_extract_invalid_utf8_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();

        let result = extract_file(&path, FileType::Text).await;
        assert!(matches!(result, Err(IngestError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_extract_missing_file_is_io_error() {
        let result = extract_file(Path::new("/nonexistent/file.txt"), FileType::Text).await;
        assert!(matches!(result, Err(IngestError::Io { .. })));
    }

    #[tokio::test]
    async fn test_extract_invalid_pdf_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        let result = extract_file(&path, FileType::Pdf).await;
        assert!(matches!(result, Err(IngestError::Pdf { .. })));
    }
}
