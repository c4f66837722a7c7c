//! Vector Index - 인메모리 벡터 저장 및 유사도 랭킹
//!
//! 추가 전용(append-only) 벡터 저장소입니다. 프로세스 수명 동안만
//! 유지되며, 코사인 유사도로 쿼리 벡터와 가장 가까운 청크를 찾습니다.
//!
//! 잠금 규율: 단일 쓰기 / 다중 읽기 (RwLock).
//! 랭킹 결과는 값으로 복사되어 반환되므로, 호출자는 잠금을 쥔 채
//! 네트워크 호출을 기다리지 않습니다.

use std::cmp::Ordering;
use std::sync::RwLock;

use anyhow::Result;
use uuid::Uuid;

// ============================================================================
// Types
// ============================================================================

/// 벡터 레코드 (저장용)
///
/// 인제스트 시점에 청크 당 정확히 한 번 생성되며 이후 불변입니다.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// 문서 ID (DocumentStore의 Document.id)
    pub doc_id: Uuid,
    /// 문서 표시 이름 (출력용 비정규화)
    pub doc_name: String,
    /// 청크 인덱스 (0-based, 문서 내 위치)
    pub chunk_index: usize,
    /// 청크 텍스트
    pub chunk_text: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 유사도 스코어가 부여된 레코드 (검색 결과)
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// 매칭된 레코드
    pub record: VectorRecord,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub score: f32,
}

// ============================================================================
// VectorIndex
// ============================================================================

/// 인메모리 벡터 인덱스
///
/// 인제스트 중에는 추가만 허용되며 기존 레코드를 수정하지 않습니다.
/// 삭제는 전체 clear만 지원합니다.
pub struct VectorIndex {
    records: RwLock<Vec<VectorRecord>>,
    dimension: usize,
}

impl VectorIndex {
    /// 지정된 차원으로 새 인덱스 생성
    pub fn new(dimension: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dimension,
        }
    }

    /// 인덱스 차원 반환
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// 레코드 배치 추가
    ///
    /// 기존 레코드는 절대 수정/삭제되지 않습니다.
    /// 차원 불일치는 인제스트 경로의 프로그래머 오류입니다.
    pub fn append(&self, records: Vec<VectorRecord>) -> Result<usize> {
        for record in &records {
            debug_assert_eq!(
                record.embedding.len(),
                self.dimension,
                "embedding dimension mismatch for doc {}",
                record.doc_id
            );
        }

        let added = records.len();
        let mut guard = self
            .records
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        guard.extend(records);

        tracing::debug!("Appended {} vectors (total: {})", added, guard.len());
        Ok(added)
    }

    /// 코사인 유사도 기준 상위 k개 랭킹
    ///
    /// 스코어 내림차순 정렬이며, 동점은 삽입 순서를 유지합니다
    /// (안정 정렬 - 결정적 결과 보장).
    /// 저장된 임베딩은 생성 시점에 이미 정규화되어 있지만,
    /// 비정규화 벡터가 들어와도 올바르도록 여기서 독립적으로 정규화합니다.
    /// 빈 인덱스는 빈 결과를 반환합니다.
    pub fn rank_by_similarity(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let guard = self
            .records
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut scored: Vec<ScoredRecord> = guard
            .iter()
            .map(|record| ScoredRecord {
                score: cosine_similarity(&record.embedding, query),
                record: record.clone(),
            })
            .collect();

        // sort_by는 안정 정렬 - 동점 시 삽입 순서 유지
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// 전체 레코드 삭제 (되돌릴 수 없음)
    pub fn clear(&self) -> Result<usize> {
        let mut guard = self
            .records
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let removed = guard.len();
        guard.clear();

        tracing::info!("Cleared vector index ({} records removed)", removed);
        Ok(removed)
    }

    /// 레코드 개수 조회
    pub fn count(&self) -> Result<usize> {
        let guard = self
            .records
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        Ok(guard.len())
    }

    /// 인덱스가 비어있는지 확인
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 두 벡터 간의 코사인 유사도를 계산합니다.
/// 결과는 -1.0 ~ 1.0 범위입니다.
/// 길이가 다르거나 영벡터가 포함되면 0.0을 반환합니다.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, index: usize, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            doc_id: Uuid::new_v4(),
            doc_name: name.to_string(),
            chunk_index: index,
            chunk_text: format!("chunk {}", index),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_same() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) - -1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_length() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_unnormalized_input() {
        // 비정규화 벡터도 독립 정규화로 1.0 유사도
        let a = vec![2.0, 0.0, 0.0];
        let b = vec![5.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_append_and_count() {
        let index = VectorIndex::new(3);
        assert!(index.is_empty().unwrap());

        index
            .append(vec![
                record("a.txt", 0, vec![1.0, 0.0, 0.0]),
                record("a.txt", 1, vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();

        assert_eq!(index.count().unwrap(), 2);
        assert!(!index.is_empty().unwrap());
    }

    #[test]
    fn test_rank_empty_index() {
        let index = VectorIndex::new(3);
        let results = index.rank_by_similarity(&[1.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let index = VectorIndex::new(2);
        index
            .append(vec![
                record("a.txt", 0, vec![0.0, 1.0]),  // 직교
                record("a.txt", 1, vec![1.0, 0.0]),  // 일치
                record("a.txt", 2, vec![1.0, 1.0]),  // 45도
            ])
            .unwrap();

        let results = index.rank_by_similarity(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].record.chunk_index, 1);
        assert!((results[0].score - 1.0).abs() < 0.0001);
        assert_eq!(results[1].record.chunk_index, 2);
        assert_eq!(results[2].record.chunk_index, 0);

        // 내림차순 확인
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn test_rank_returns_at_most_k() {
        let index = VectorIndex::new(2);
        index
            .append(vec![
                record("a.txt", 0, vec![1.0, 0.0]),
                record("a.txt", 1, vec![1.0, 0.0]),
                record("a.txt", 2, vec![1.0, 0.0]),
                record("a.txt", 3, vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = index.rank_by_similarity(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        // 동일 임베딩 -> 동점 -> 삽입 순서 유지 (안정 정렬)
        let index = VectorIndex::new(2);
        index
            .append(vec![
                record("first.txt", 0, vec![1.0, 0.0]),
                record("second.txt", 0, vec![1.0, 0.0]),
                record("third.txt", 0, vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = index.rank_by_similarity(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].record.doc_name, "first.txt");
        assert_eq!(results[1].record.doc_name, "second.txt");
        assert_eq!(results[2].record.doc_name, "third.txt");
    }

    #[test]
    fn test_clear() {
        let index = VectorIndex::new(2);
        index
            .append(vec![record("a.txt", 0, vec![1.0, 0.0])])
            .unwrap();

        let removed = index.clear().unwrap();
        assert_eq!(removed, 1);
        assert!(index.is_empty().unwrap());

        let results = index.rank_by_similarity(&[1.0, 0.0], 3).unwrap();
        assert!(results.is_empty());
    }
}
