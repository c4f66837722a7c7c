//! Document Store - 인메모리 문서 메타데이터 저장소
//!
//! 인제스트된 문서의 메타데이터(이름, 원본 텍스트, 청크 수, 수집 시각)를
//! 삽입 순서대로 보관합니다. 프로세스 수명 동안만 유지됩니다.
//!
//! 개별 수정/삭제는 지원하지 않으며 전체 clear만 가능합니다.
//! 같은 이름의 문서를 다시 인제스트하면 새 ID의 독립된 문서가 됩니다
//! (중복 제거 없음 - 의도된 동작).

use std::sync::RwLock;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Types
// ============================================================================

/// 인제스트된 문서
///
/// ID는 인제스트 시점에 생성되며, 생성 후 불변입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// 고유 ID (인제스트 시 생성)
    pub id: Uuid,
    /// 표시 이름 (보통 파일 이름)
    pub name: String,
    /// 원본 전체 텍스트
    pub content: String,
    /// 생성된 청크 수
    pub chunk_count: usize,
    /// 인제스트 시각
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// 새 문서 생성 (ID와 타임스탬프 자동 부여)
    pub fn new(name: impl Into<String>, content: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            chunk_count,
            created_at: Utc::now(),
        }
    }
}

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub total_content_bytes: usize,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// 인메모리 문서 저장소
///
/// 단일 쓰기 / 다중 읽기 (RwLock) 규율을 따릅니다.
pub struct DocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    /// 문서 추가
    pub fn add(&self, doc: Document) -> Result<()> {
        let mut guard = self
            .docs
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        tracing::info!(
            "Added document: {} (id={}, chunks={})",
            doc.name,
            doc.id,
            doc.chunk_count
        );
        guard.push(doc);
        Ok(())
    }

    /// 문서 목록 조회 (삽입 순서)
    pub fn list(&self) -> Result<Vec<Document>> {
        let guard = self
            .docs
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        Ok(guard.clone())
    }

    /// 문서 개수 조회
    pub fn count(&self) -> Result<usize> {
        let guard = self
            .docs
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        Ok(guard.len())
    }

    /// 전체 문서 삭제 (되돌릴 수 없음)
    pub fn clear(&self) -> Result<usize> {
        let mut guard = self
            .docs
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let removed = guard.len();
        guard.clear();

        tracing::info!("Cleared document store ({} documents removed)", removed);
        Ok(removed)
    }

    /// 저장소 통계
    pub fn stats(&self) -> Result<StoreStats> {
        let guard = self
            .docs
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        Ok(StoreStats {
            document_count: guard.len(),
            total_content_bytes: guard.iter().map(|d| d.content.len()).sum(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list() {
        let store = DocumentStore::new();

        store
            .add(Document::new("a.txt", "alpha content", 1))
            .unwrap();
        store
            .add(Document::new("b.txt", "beta content", 2))
            .unwrap();

        let docs = store.list().unwrap();
        assert_eq!(docs.len(), 2);
        // 삽입 순서 유지
        assert_eq!(docs[0].name, "a.txt");
        assert_eq!(docs[1].name, "b.txt");
        assert_eq!(docs[1].chunk_count, 2);
    }

    #[test]
    fn test_same_name_gets_independent_identity() {
        // 같은 이름 재인제스트 -> 새 ID의 독립 문서
        let store = DocumentStore::new();

        store.add(Document::new("dup.txt", "content", 1)).unwrap();
        store.add(Document::new("dup.txt", "content", 1)).unwrap();

        let docs = store.list().unwrap();
        assert_eq!(docs.len(), 2);
        assert_ne!(docs[0].id, docs[1].id);
    }

    #[test]
    fn test_clear() {
        let store = DocumentStore::new();
        store.add(Document::new("a.txt", "content", 1)).unwrap();

        let removed = store.clear().unwrap();
        assert_eq!(removed, 1);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_stats() {
        let store = DocumentStore::new();
        store.add(Document::new("a.txt", "1234567890", 1)).unwrap(); // 10 bytes

        let stats = store.stats().unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.total_content_bytes, 10);
    }
}
