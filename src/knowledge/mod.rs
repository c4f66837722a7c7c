//! Knowledge 모듈 - 인메모리 RAG 코어
//!
//! - Store: 문서 메타데이터 저장 (삽입 순서)
//! - Vector: 추가 전용 벡터 인덱스 + 코사인 유사도 랭킹
//! - Chunker: 단어 수 기반 텍스트 분할
//! - Pipeline: 청킹 -> 임베딩 -> 저장 오케스트레이션 (파일 단위 원자성)
//! - Engine: 검색 + 완성 호출 + 폴백을 묶은 세션 파사드

mod chunker;
mod engine;
mod pipeline;
mod store;
mod vector;

// Re-exports
pub use chunker::{
    default_chunker, word_chunker, ChunkConfig, Chunker, WordChunker, DEFAULT_CHUNK_SIZE,
};
pub use engine::{
    EngineStats, QueryOutcome, QueryResult, RagEngine, DEFAULT_TOP_K, FALLBACK_CONTEXT_CHARS,
    FALLBACK_PREFIX,
};
pub use pipeline::{IngestError, IngestFailure, IngestReport, IngestionPipeline};
pub use store::{Document, DocumentStore, StoreStats};
pub use vector::{cosine_similarity, ScoredRecord, VectorIndex, VectorRecord};
