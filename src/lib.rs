//! rag-analyzer - 인메모리 RAG 파이프라인
//!
//! 해시 임베딩 + 코사인 유사도 검색으로 문서를 인덱싱하고,
//! Claude 완성 호출(실패 시 결정적 폴백)로 답변을 생성합니다.

pub mod cli;
pub mod collector;
pub mod completion;
pub mod embedding;
pub mod extractor;
pub mod knowledge;

// Re-exports
pub use collector::{CollectedFile, CollectionStats, CollectorConfig, FileCollector, FileType};
pub use completion::{get_api_key, has_api_key, ClaudeCompletion, CompletionProvider};
pub use embedding::{EmbeddingProvider, HashEmbedding, EMBEDDING_DIMENSION};
pub use knowledge::{
    cosine_similarity, default_chunker, word_chunker, ChunkConfig, Chunker, Document,
    DocumentStore, EngineStats, IngestError, IngestReport, IngestionPipeline, QueryOutcome,
    QueryResult, RagEngine, ScoredRecord, StoreStats, VectorIndex, VectorRecord, WordChunker,
    DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K,
};
