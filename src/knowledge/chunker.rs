//! Text Chunking Module
//!
//! 단어 수 기반 텍스트 분할을 제공합니다.
//! 의미 경계(문장/문단)를 인식하지 않는 순수 위치 기반 분할입니다 -
//! 단순하고 검증 가능한 알고리즘을 의도적으로 유지합니다.

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 기본 청크 크기 (단어 수)
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 청크 당 최대 단어 수
    pub chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ChunkConfig {
    /// 청크 크기 지정 생성
    pub fn with_size(chunk_size: usize) -> Self {
        // 0은 무의미하므로 최소 1로 보정
        Self {
            chunk_size: chunk_size.max(1),
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

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// WordChunker
// ============================================================================

/// 단어 수 기반 청커
///
/// 텍스트를 공백 단위 단어 시퀀스로 분할한 뒤,
/// 최대 `chunk_size` 단어씩 묶어 단일 공백으로 결합합니다.
/// 마지막 청크는 더 짧을 수 있습니다.
///
/// 공백만 있는 입력(단어 0개)은 빈 청크 목록을 반환합니다.
pub struct WordChunker {
    config: ChunkConfig,
}

impl WordChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 생성 (500 단어)
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 청크 크기 반환
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        // 단어가 없으면 청크 0개 (빈 청크 1개가 아님)
        if words.is_empty() {
            return vec![];
        }

        words
            .chunks(self.config.chunk_size)
            .map(|group| group.join(" "))
            .collect()
    }

    fn name(&self) -> &'static str {
        "WordChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(WordChunker::with_defaults())
}

/// 단어 청커 생성 (설정 지정)
pub fn word_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(WordChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
