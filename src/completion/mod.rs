//! 완성(completion) 모듈 - 외부 언어모델 호출
//!
//! 검색된 컨텍스트와 질문을 외부 완성 서비스(Anthropic Messages API)에
//! 전달하여 자연어 답변을 생성합니다.
//!
//! 재시도 정책은 없습니다: 단일 시도 후 실패하면 호출자가 결정적
//! 폴백 답변을 생성합니다. 전송 타임아웃이 호출 시간을 제한합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let llm = ClaudeCompletion::from_env()?;
//! let answer = llm.complete(&prompt).await?;
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// CompletionProvider Trait
// ============================================================================

/// 완성 프로바이더 트레이트
///
/// 프롬프트를 받아 텍스트 답변을 생성하는 인터페이스입니다.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 프롬프트에 대한 완성 텍스트 생성 (단일 시도)
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Anthropic Messages API
// ============================================================================

/// Anthropic Messages API 엔드포인트
/// source: https://docs.anthropic.com/en/api/messages
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API 버전 헤더 값
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// 기본 모델
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// 기본 최대 출력 토큰 수
pub const DEFAULT_MAX_TOKENS: u32 = 400;

/// HTTP 타임아웃 (완성 호출의 상한)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anthropic Messages API 완성 구현체
#[derive(Debug)]
pub struct ClaudeCompletion {
    api_key: String,
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
}

impl ClaudeCompletion {
    /// 새 인스턴스 생성 (기본 모델)
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API 키 (빈 문자열이면 호출은 인증 실패로
    ///   끝나고 호출자의 폴백 경로가 동작합니다)
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// 모델을 지정하여 생성
    pub fn with_model(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// 환경변수에서 API 키를 읽어 생성
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key()?;
        Self::new(api_key)
    }

    /// 최대 출력 토큰 수 설정
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Messages API 요청 본문
/// source: https://docs.anthropic.com/en/api/messages
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Messages API 응답
///
/// content는 블록 시퀀스이며, 첫 번째 text 타입 블록을 답변으로 사용합니다.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// 첫 번째 텍스트 블록 추출
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text.as_deref())
    }
}

/// API 에러 응답
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[async_trait]
impl CompletionProvider for ClaudeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send completion request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read completion response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiError>(&body) {
                anyhow::bail!(
                    "Completion API error ({}): {}",
                    error.error.kind,
                    error.error.message
                );
            }
            anyhow::bail!("Completion API error ({}): {}", status, body);
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).context("Failed to parse completion response")?;

        parsed
            .first_text()
            .map(|text| text.to_string())
            .ok_or_else(|| anyhow::anyhow!("Completion response has no text content block"))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `ANTHROPIC_API_KEY` 환경변수
/// 2. `CLAUDE_API_KEY` 환경변수
pub fn get_api_key() -> Result<String> {
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from ANTHROPIC_API_KEY");
            return Ok(key);
        }
    }

    if let Ok(key) = std::env::var("CLAUDE_API_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from CLAUDE_API_KEY");
            return Ok(key);
        }
    }

    anyhow::bail!("API key not found. Set ANTHROPIC_API_KEY or CLAUDE_API_KEY environment variable.")
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    for var in ["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return true;
            }
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_block_extraction() {
        let body = r#"{
            "content": [
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "The answer."},
                {"type": "text", "text": "Second block."}
            ]
        }"#;

        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.first_text(), Some("The answer."));
    }

    #[test]
    fn test_response_without_text_block() {
        let body = r#"{"content": [{"type": "tool_use", "id": "x"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.first_text(), None);

        let body = r#"{"content": []}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.first_text(), None);
    }

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 400,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 400);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_api_error_parsing() {
        let body = r#"{"error": {"type": "authentication_error", "message": "invalid key"}}"#;
        let parsed: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.kind, "authentication_error");
        assert_eq!(parsed.error.message, "invalid key");
    }

    #[test]
    fn test_builder() {
        let llm = ClaudeCompletion::new("test-key".to_string())
            .unwrap()
            .max_tokens(128);
        assert_eq!(llm.max_tokens, 128);
        assert_eq!(llm.name(), DEFAULT_MODEL);
    }
}
