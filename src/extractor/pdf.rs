//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.

use std::path::Path;

use crate::knowledge::IngestError;

/// PDF에서 전체 텍스트 추출
///
/// 읽기/파싱 실패는 해당 파일에 국한된 오류로 보고합니다.
/// 스캔 문서처럼 텍스트가 없는 PDF는 빈 문자열을 반환합니다
/// (청커가 청크 0개로 처리).
pub fn extract_text_from_pdf(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| IngestError::Pdf {
        name: name.clone(),
        message: e.to_string(),
    })?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
    }

    // 폼피드(페이지 구분)는 일반 공백으로 - 청킹은 위치 기반이므로
    // 페이지 경계를 유지할 필요가 없음
    Ok(text.replace('\x0c', "\n\n"))
}

// ============================================================================
// Tests
// ============================================================================
