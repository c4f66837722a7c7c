//! 임베딩 모듈 - 결정적 해시 벡터화
//!
//! 텍스트를 고정 차원 벡터로 변환합니다.
//!
//! 기본 구현(`HashEmbedding`)은 학습된 모델이 아니라
//! 문자 코드 + 단어 위치 기반의 결정적 해시 시그니처입니다.
//! 시맨틱 임베딩이 아니라는 점은 알려진 한계이며,
//! 실제 모델로 교체할 수 있도록 트레이트 뒤에 숨겨져 있습니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = HashEmbedding::new();
//! let vector = embedder.embed("Hello, world!").await?;
//! ```

use anyhow::Result;
use async_trait::async_trait;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
/// 네트워크 기반 모델을 수용할 수 있도록 async로 정의합니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Hash Embedding
// ============================================================================

/// 기본 임베딩 차원
pub const EMBEDDING_DIMENSION: usize = 100;

/// 결정적 해시 임베딩
///
/// 알고리즘:
/// 1. 소문자 변환 후 공백 기준 단어 분할
/// 2. 단어 위치 `idx`의 각 문자 `c`에 대해
///    `vector[(c + idx) % D] += 1`
/// 3. 유클리드 노름으로 정규화 (노름 0이면 1로 나눔)
///
/// 결과는 단위 벡터이며, 빈 입력만 영벡터를 만듭니다.
/// (문자, 단어위치 mod D) 기여가 같은 두 텍스트는 충돌합니다 -
/// 수용된 근사이지 버그가 아닙니다.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEmbedding {
    /// 기본 차원(100)으로 생성
    pub fn new() -> Self {
        Self::with_dimension(EMBEDDING_DIMENSION)
    }

    /// 차원을 지정하여 생성
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// 동기 임베딩 계산
    ///
    /// 순수 CPU 연산이므로 트레이트와 달리 await가 필요 없습니다.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for (idx, word) in text.to_lowercase().split_whitespace().enumerate() {
            for ch in word.chars() {
                let slot = (ch as usize + idx) % self.dimension;
                vector[slot] += 1.0;
            }
        }

        // L2 정규화 (0으로 나누기 방지)
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let divisor = if norm == 0.0 { 1.0 } else { norm };
        for value in &mut vector {
            *value /= divisor;
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash-embedding"
    }
}

// ============================================================================
// Tests
// ============================================================================
