//! Ingestion Pipeline - 청킹 -> 임베딩 -> 인덱스/저장소 오케스트레이션
//!
//! 파일 하나의 인제스트는 원자적입니다: 청크/벡터/메타데이터가
//! 전부 추가되거나 전혀 추가되지 않습니다. 모든 임베딩을 스테이징
//! 버퍼에 먼저 모은 뒤에야 저장소를 건드리는 것으로 보장합니다.
//!
//! 배치 인제스트는 파일 순서대로 순차 처리하며, 한 파일의 실패가
//! 이미 커밋된 이전 파일의 상태를 훼손하지 않습니다.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use thiserror::Error;

use crate::collector::FileType;
use crate::embedding::EmbeddingProvider;
use crate::extractor;

use super::chunker::Chunker;
use super::store::{Document, DocumentStore};
use super::vector::{VectorIndex, VectorRecord};

// ============================================================================
// Errors
// ============================================================================

/// 파일 단위 인제스트 오류
///
/// 모든 변종은 해당 파일에만 국한되며, 배치의 다른 파일 처리를
/// 중단시키지 않습니다.
#[derive(Debug, Error)]
pub enum IngestError {
    /// 파일 읽기 실패
    #[error("파일을 읽을 수 없습니다: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 바이트를 텍스트로 해석할 수 없음
    #[error("텍스트 디코딩 실패: {name}")]
    Decode {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// PDF 텍스트 추출 실패
    #[error("PDF 텍스트 추출 실패: {name}: {message}")]
    Pdf { name: String, message: String },

    /// 지원하지 않는 파일 형식
    #[error("지원하지 않는 파일 형식: {path}")]
    Unsupported { path: PathBuf },

    /// 임베딩 프로바이더 오류
    #[error("임베딩 생성 실패: {name}: {message}")]
    Embed { name: String, message: String },

    /// 저장소 잠금/쓰기 오류
    #[error("저장소 오류: {message}")]
    Store { message: String },
}

/// 배치 인제스트 중 실패한 파일 기록
#[derive(Debug)]
pub struct IngestFailure {
    /// 파일 이름 (또는 경로 표시)
    pub name: String,
    /// 실패 원인
    pub error: IngestError,
}

/// 배치 인제스트 결과
///
/// 성공한 문서와 파일별 실패를 함께 보고합니다.
/// 실패가 있어도 배치 전체가 중단되지 않습니다.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// 성공적으로 인제스트된 문서
    pub documents: Vec<Document>,
    /// 파일별 실패 기록
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// 성공 건수
    pub fn succeeded(&self) -> usize {
        self.documents.len()
    }

    /// 실패 건수
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

// ============================================================================
// IngestionPipeline
// ============================================================================

/// 인제스트 파이프라인
///
/// Chunker -> Embedder -> VectorIndex/DocumentStore 순서로
/// 문서 하나를 처리합니다.
pub struct IngestionPipeline {
    store: Arc<DocumentStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Box<dyn Chunker>,
    /// 세션 잠금: 두 저장소를 함께 갱신하는 커밋과 전체 초기화를
    /// 직렬화합니다. 개별 저장소의 RwLock만으로는 커밋의 두 단계
    /// 사이에 clear가 끼어들 수 있습니다.
    commit_lock: Mutex<()>,
}

impl IngestionPipeline {
    /// 새 파이프라인 생성
    pub fn new(
        store: Arc<DocumentStore>,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Box<dyn Chunker>,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            chunker,
            commit_lock: Mutex::new(()),
        }
    }

    /// 텍스트 인제스트
    ///
    /// 청킹과 임베딩을 전부 마친 뒤에만 인덱스와 저장소에 기록합니다.
    /// 중간 실패 시 두 저장소 모두 변경되지 않습니다.
    pub async fn ingest_text(&self, name: &str, text: &str) -> Result<Document, IngestError> {
        let chunks = self.chunker.chunk(text);
        let doc = Document::new(name, text, chunks.len());

        if chunks.is_empty() {
            tracing::warn!("No chunks generated for document: {}", name);
        }

        // 스테이징: 저장소를 건드리기 전에 모든 레코드를 완성
        let mut records = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let embedding =
                self.embedder
                    .embed(chunk)
                    .await
                    .map_err(|e| IngestError::Embed {
                        name: name.to_string(),
                        message: e.to_string(),
                    })?;

            records.push(VectorRecord {
                doc_id: doc.id,
                doc_name: doc.name.clone(),
                chunk_index: i,
                chunk_text: chunk.clone(),
                embedding,
            });
        }

        // 커밋: 벡터 배치 추가 후 문서 메타데이터 저장.
        // 세션 잠금을 쥔 채 두 단계를 수행하여 clear와 상호 배제 -
        // 벡터 없는 문서나 문서 없는 벡터가 관찰되지 않음
        let record_count = records.len();
        let _commit = self.commit_lock.lock().map_err(|e| IngestError::Store {
            message: format!("Lock error: {}", e),
        })?;
        self.index
            .append(records)
            .map_err(|e| IngestError::Store {
                message: e.to_string(),
            })?;
        self.store
            .add(doc.clone())
            .map_err(|e| IngestError::Store {
                message: e.to_string(),
            })?;
        drop(_commit);

        tracing::info!(
            "Ingested document: {} (id={}, chunks={})",
            doc.name,
            doc.id,
            record_count
        );

        Ok(doc)
    }

    /// 바이트 인제스트 (UTF-8 디코딩)
    ///
    /// 디코딩 실패는 파일 단위 오류로 보고되며 상태를 변경하지 않습니다.
    pub async fn ingest_bytes(&self, name: &str, bytes: &[u8]) -> Result<Document, IngestError> {
        let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Decode {
            name: name.to_string(),
            source: e,
        })?;
        self.ingest_text(name, text).await
    }

    /// 파일 인제스트 (형식 판별 + 텍스트 추출)
    pub async fn ingest_file(&self, path: &Path) -> Result<Document, IngestError> {
        let file_type = FileType::from_path(path).ok_or_else(|| IngestError::Unsupported {
            path: path.to_path_buf(),
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let text = extractor::extract_file(path, file_type).await?;
        self.ingest_text(&name, &text).await
    }

    /// 파일 배치 인제스트 (제출 순서대로 순차 처리)
    ///
    /// 개별 파일의 실패는 보고서에 기록되고 다음 파일로 진행합니다.
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();

        for path in paths {
            let display_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            match self.ingest_file(path).await {
                Ok(doc) => report.documents.push(doc),
                Err(error) => {
                    tracing::warn!("Failed to ingest {}: {}", display_name, error);
                    report.failures.push(IngestFailure {
                        name: display_name,
                        error,
                    });
                }
            }
        }

        report
    }

    /// 전체 초기화 (벡터 + 문서 모두 삭제)
    ///
    /// 커밋과 같은 세션 잠금을 쥐므로 진행 중인 인제스트와
    /// 상호 배제됩니다. 두 저장소는 항상 함께 비워집니다.
    pub fn clear(&self) -> Result<()> {
        let _commit = self
            .commit_lock
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        self.index.clear()?;
        self.store.clear()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
