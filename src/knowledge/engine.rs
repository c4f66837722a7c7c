//! RAG Engine - 검색 오케스트레이션 및 세션 파사드
//!
//! 쿼리 임베딩 -> 유사도 랭킹 -> 컨텍스트 조립 -> 완성 호출 -> 폴백의
//! 전체 흐름을 담당합니다. 인제스트/목록/초기화까지 포함한
//! 호출자용 단일 진입점입니다.
//!
//! 완성 호출 실패는 이 경계에서 전부 흡수됩니다: 호출자는 항상
//! 정상적인 `QueryOutcome`을 받으며, 폴백 경로만 품질 저하로 로깅됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::completion::CompletionProvider;
use crate::embedding::{EmbeddingProvider, HashEmbedding};

use super::chunker::{default_chunker, Chunker};
use super::pipeline::{IngestError, IngestReport, IngestionPipeline};
use super::store::{Document, DocumentStore};
use super::vector::{ScoredRecord, VectorIndex};

// ============================================================================
// Constants
// ============================================================================

/// 기본 검색 결과 수 (top-k)
pub const DEFAULT_TOP_K: usize = 3;

/// 폴백 답변 접두사 (고정 - 결정적 폴백 계약의 일부)
pub const FALLBACK_PREFIX: &str =
    "[폴백] 완성 서비스에 연결하지 못했습니다. 가장 관련성 높은 컨텍스트 발췌:\n\n";

/// 폴백에 포함할 컨텍스트 최대 문자 수
pub const FALLBACK_CONTEXT_CHARS: usize = 500;

/// 폴백 말줄임 표시
const FALLBACK_ELLIPSIS: &str = "...";

// ============================================================================
// Types
// ============================================================================

/// 쿼리 결과
///
/// 쿼리마다 새로 계산되며 저장되지 않습니다.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// 답변 텍스트
    pub answer: String,
    /// 스코어 순으로 정렬된 근거 청크 (최대 k개)
    pub sources: Vec<ScoredRecord>,
    /// 폴백 경로로 생성된 답변인지 여부
    pub degraded: bool,
    /// 답변 생성 시각
    pub answered_at: DateTime<Utc>,
}

/// 쿼리 수행 결과
///
/// 빈 쿼리와 빈 인덱스는 오류가 아니라 no-op 변종으로 표현됩니다.
/// 호출자는 항상 정상 값을 받습니다.
#[derive(Debug)]
pub enum QueryOutcome {
    /// 답변 생성됨 (완성 또는 폴백)
    Answered(QueryResult),
    /// 빈 쿼리 - 아무 작업도 수행하지 않음
    EmptyQuery,
    /// 빈 인덱스 - 검색할 대상이 없음
    EmptyIndex,
}

/// 엔진 통계
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub document_count: usize,
    pub vector_count: usize,
    pub total_content_bytes: usize,
}

// ============================================================================
// RagEngine
// ============================================================================

/// RAG 엔진
///
/// DocumentStore + VectorIndex + Embedder + IngestionPipeline +
/// CompletionProvider를 하나로 묶은 세션 파사드입니다.
pub struct RagEngine {
    store: Arc<DocumentStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    pipeline: IngestionPipeline,
    completion: Box<dyn CompletionProvider>,
}

impl RagEngine {
    /// 기본 구성으로 생성 (해시 임베딩 + 단어 청커)
    pub fn new(completion: Box<dyn CompletionProvider>) -> Self {
        Self::with_parts(
            Arc::new(HashEmbedding::new()),
            default_chunker(),
            completion,
        )
    }

    /// 구성 요소를 지정하여 생성
    pub fn with_parts(
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Box<dyn Chunker>,
        completion: Box<dyn CompletionProvider>,
    ) -> Self {
        let store = Arc::new(DocumentStore::new());
        let index = Arc::new(VectorIndex::new(embedder.dimension()));
        let pipeline = IngestionPipeline::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&embedder),
            chunker,
        );

        Self {
            store,
            index,
            embedder,
            pipeline,
            completion,
        }
    }

    // ------------------------------------------------------------------
    // Ingestion (IngestionPipeline 위임)
    // ------------------------------------------------------------------

    /// 텍스트 인제스트
    pub async fn ingest_text(&self, name: &str, text: &str) -> Result<Document, IngestError> {
        self.pipeline.ingest_text(name, text).await
    }

    /// 파일 인제스트
    pub async fn ingest_file(&self, path: &Path) -> Result<Document, IngestError> {
        self.pipeline.ingest_file(path).await
    }

    /// 파일 배치 인제스트 (파일 단위 실패 격리)
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> IngestReport {
        self.pipeline.ingest_files(paths).await
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// 쿼리에 대한 답변 생성
    ///
    /// 흐름: 쿼리 임베딩 -> top-k 랭킹 -> 컨텍스트 조립 -> 완성 호출.
    /// 완성 실패 시 결정적 폴백 답변으로 대체하며, 이 경로는
    /// 호출자에게 오류를 전파하지 않습니다.
    ///
    /// 컨텍스트와 근거는 완성 호출 전에 값으로 캡처되므로,
    /// 네트워크 대기 중 어떤 저장소 잠금도 쥐지 않습니다.
    pub async fn answer(&self, query: &str, k: usize) -> Result<QueryOutcome> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Rejecting empty query (no-op)");
            return Ok(QueryOutcome::EmptyQuery);
        }

        if self.index.is_empty()? {
            tracing::debug!("Query against empty index (no-op)");
            return Ok(QueryOutcome::EmptyIndex);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let sources = self.index.rank_by_similarity(&query_embedding, k.max(1))?;

        // clear()와의 경합으로 랭킹 결과가 비어있을 수 있음
        if sources.is_empty() {
            return Ok(QueryOutcome::EmptyIndex);
        }

        let context = build_context(&sources);
        let prompt = build_prompt(&context, &sources, query);

        let (answer, degraded) = match self.completion.complete(&prompt).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!("Completion failed, using fallback answer: {}", e);
                (fallback_answer(&context), true)
            }
        };

        Ok(QueryOutcome::Answered(QueryResult {
            answer,
            sources,
            degraded,
            answered_at: Utc::now(),
        }))
    }

    /// 검색 없이 완성 서비스에 직접 질문
    ///
    /// 인덱스를 전혀 거치지 않는 일반 어시스턴트 경로입니다.
    /// 컨텍스트가 없으므로 폴백도 없습니다: 완성 실패는 오류로
    /// 전파됩니다. 빈 질문은 `None`을 반환합니다.
    pub async fn answer_direct(&self, query: &str) -> Result<Option<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let answer = self.completion.complete(query).await?;
        Ok(Some(answer))
    }

    // ------------------------------------------------------------------
    // Session management
    // ------------------------------------------------------------------

    /// 문서 목록 조회 (삽입 순서)
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        self.store.list()
    }

    /// 전체 초기화 (문서 + 벡터 모두 삭제)
    ///
    /// 인제스트 커밋과 같은 세션 잠금 아래에서 수행되므로, 커밋의
    /// 두 저장소 갱신 사이에 초기화가 끼어들 수 없습니다.
    pub fn clear_all(&self) -> Result<()> {
        self.pipeline.clear()
    }

    /// 엔진 통계
    pub fn stats(&self) -> Result<EngineStats> {
        let store_stats = self.store.stats()?;
        let vector_count = self.index.count()?;

        Ok(EngineStats {
            document_count: store_stats.document_count,
            vector_count,
            total_content_bytes: store_stats.total_content_bytes,
        })
    }

    /// 내부 파이프라인 접근
    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.pipeline
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 랭킹된 청크 텍스트를 빈 줄로 구분하여 컨텍스트 블록 조립
fn build_context(sources: &[ScoredRecord]) -> String {
    sources
        .iter()
        .map(|s| s.record.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 완성 요청 프롬프트 조립
///
/// 컨텍스트에서만 답하고 출처를 인용하도록 지시합니다.
fn build_prompt(context: &str, sources: &[ScoredRecord], query: &str) -> String {
    // 첫 등장 순서 유지, 비연속 중복도 제거 (랭킹은 문서를 교차시킬 수 있음)
    let mut names: Vec<&str> = Vec::new();
    for source in sources {
        let name = source.record.doc_name.as_str();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    format!(
        "Answer ONLY from the context below.\n\
         If the answer is not in the context, say: Not found in the documents.\n\
         Cite the names of the source documents you used.\n\n\
         Context:\n{context}\n\n\
         Sources: {sources}\n\n\
         Question: {query}\n\
         Answer:",
        context = context,
        sources = names.join(", "),
        query = query,
    )
}

/// 결정적 폴백 답변 생성
///
/// 고정 접두사 + 컨텍스트 앞 500자 + 말줄임.
/// 컨텍스트가 500자보다 짧아도 형태는 동일합니다 (단일 결정적 형태).
/// 이 함수는 어떤 경우에도 실패하지 않습니다.
fn fallback_answer(context: &str) -> String {
    let excerpt: String = context.chars().take(FALLBACK_CONTEXT_CHARS).collect();
    format!("{}{}{}", FALLBACK_PREFIX, excerpt, FALLBACK_ELLIPSIS)
}

// ============================================================================
// Tests
// ============================================================================
