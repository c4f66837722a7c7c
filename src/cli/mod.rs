//! CLI 모듈
//!
//! rag-analyzer CLI 명령어 정의 및 구현
//!
//! 인덱스는 프로세스 수명 동안만 유지되므로, 모든 명령어는
//! 인제스트와 질의를 한 세션 안에서 수행합니다:
//! - ask: 파일 인제스트 후 질문 하나에 답변 (일회성)
//! - chat: 파일 인제스트 후 대화형 질의 루프

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::collector::{CollectionStats, CollectorConfig, FileCollector};
use crate::completion::{get_api_key, has_api_key, ClaudeCompletion};
use crate::knowledge::{QueryOutcome, QueryResult, RagEngine, DEFAULT_TOP_K};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rag-analyzer")]
#[command(version, about = "인메모리 RAG 파이프라인", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 파일을 인제스트하고 질문 하나에 답변
    Ask {
        /// 질문
        query: String,

        /// 인제스트할 파일 경로 (반복 지정 가능)
        #[arg(short, long)]
        file: Vec<PathBuf>,

        /// 인제스트할 폴더 경로 (재귀)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// 검색할 근거 청크 수 (top-k)
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// PDF 파일 건너뛰기
        #[arg(long)]
        skip_pdfs: bool,
    },

    /// 파일을 인제스트하고 대화형 질의 세션 시작
    Chat {
        /// 인제스트할 파일 경로 (반복 지정 가능)
        #[arg(short, long)]
        file: Vec<PathBuf>,

        /// 인제스트할 폴더 경로 (재귀)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// 검색할 근거 청크 수 (top-k)
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// PDF 파일 건너뛰기
        #[arg(long)]
        skip_pdfs: bool,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            query,
            file,
            dir,
            top_k,
            skip_pdfs,
        } => cmd_ask(&query, file, dir, top_k, skip_pdfs).await,
        Commands::Chat {
            file,
            dir,
            top_k,
            skip_pdfs,
        } => cmd_chat(file, dir, top_k, skip_pdfs).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 일회성 질의 명령어 (ask)
async fn cmd_ask(
    query: &str,
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    top_k: usize,
    skip_pdfs: bool,
) -> Result<()> {
    let engine = build_engine()?;
    ingest_sources(&engine, files, dir, skip_pdfs).await?;

    let outcome = engine
        .answer(query, top_k)
        .await
        .context("질의 처리 실패")?;
    print_outcome(&outcome);

    Ok(())
}

/// 대화형 세션 명령어 (chat)
///
/// 특수 명령어: :list, :stats, :clear, :quit
async fn cmd_chat(
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    top_k: usize,
    skip_pdfs: bool,
) -> Result<()> {
    let engine = build_engine()?;
    ingest_sources(&engine, files, dir, skip_pdfs).await?;

    println!();
    println!("[*] 대화형 세션 시작 (:quit 종료, :list 문서 목록, :stats 통계, :clear 초기화)");
    println!("    :ai <질문> - 문서 검색 없이 모델에 직접 질문");

    let stdin = std::io::stdin();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match input {
            "" => continue,
            ":quit" | ":exit" | ":q" => break,
            ":list" => cmd_list(&engine)?,
            ":stats" => cmd_stats(&engine)?,
            ":clear" => {
                engine.clear_all().context("초기화 실패")?;
                println!("[OK] 모든 문서와 벡터가 삭제되었습니다");
            }
            _ if input.starts_with(":ai") => {
                let question = input.trim_start_matches(":ai").trim();
                match engine.answer_direct(question).await {
                    Ok(Some(answer)) => println!("\n{}", answer),
                    Ok(None) => println!("[!] 질문을 입력하세요: :ai <질문>"),
                    Err(e) => println!("[!] 완성 호출 실패: {}", e),
                }
            }
            _ => {
                let outcome = engine.answer(input, top_k).await.context("질의 처리 실패")?;
                print_outcome(&outcome);
            }
        }
    }

    println!("[*] 세션을 종료합니다");
    Ok(())
}

/// 문서 목록 출력
fn cmd_list(engine: &RagEngine) -> Result<()> {
    let docs = engine.list_documents().context("문서 목록 조회 실패")?;

    if docs.is_empty() {
        println!("[!] 저장된 문서가 없습니다.");
        return Ok(());
    }

    println!("[OK] 저장된 문서 ({} 건):\n", docs.len());

    for doc in docs {
        println!("  {} [{} 청크]", doc.name, doc.chunk_count);
        println!(
            "      {} | {} | id: {}",
            doc.created_at.format("%Y-%m-%d %H:%M"),
            format_bytes(doc.content.len()),
            doc.id
        );
    }

    Ok(())
}

/// 세션 통계 출력
fn cmd_stats(engine: &RagEngine) -> Result<()> {
    let stats = engine.stats().context("통계 조회 실패")?;

    println!("[OK] 세션 통계:");
    println!("     문서: {} 건", stats.document_count);
    println!("     벡터: {} 청크", stats.vector_count);
    println!("     콘텐츠: {}", format_bytes(stats.total_content_bytes));

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 엔진 생성 (API 키 없이도 동작 - 폴백 답변만 제공)
fn build_engine() -> Result<RagEngine> {
    if !has_api_key() {
        println!("[!] ANTHROPIC_API_KEY 미설정 - 완성 호출 없이 폴백 답변만 제공됩니다");
    }

    let api_key = get_api_key().unwrap_or_default();
    let completion = ClaudeCompletion::new(api_key).context("완성 클라이언트 생성 실패")?;

    Ok(RagEngine::new(Box::new(completion)))
}

/// 파일/폴더 수집 후 인제스트 (파일별 진행 상황 출력)
async fn ingest_sources(
    engine: &RagEngine,
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    skip_pdfs: bool,
) -> Result<()> {
    if files.is_empty() && dir.is_none() {
        bail!("--file 또는 --dir로 인제스트할 소스를 지정해야 합니다");
    }

    let config = CollectorConfig {
        skip_pdfs,
        ..Default::default()
    };
    let collector = FileCollector::new(config);

    // 수집
    let mut collected = Vec::new();
    for path in &files {
        match collector.collect_file(path)? {
            Some(f) => collected.push(f),
            None => println!("[!] 지원하지 않는 파일 형식: {:?}", path),
        }
    }
    if let Some(ref dir_path) = dir {
        collected.extend(collector.collect_directory(dir_path)?);
    }

    if collected.is_empty() {
        bail!("수집할 파일이 없습니다");
    }

    // 통계 표시
    let stats = CollectionStats::from_files(&collected);
    println!("[*] 수집 대상: {} 파일", stats.total_files);
    println!(
        "    텍스트: {}, PDF: {} | 총 크기: {}",
        stats.text_files,
        stats.pdf_files,
        format_bytes(stats.total_size as usize)
    );

    // 파일별 인제스트 (실패는 해당 파일에만 국한)
    let mut success_count = 0;
    let mut error_count = 0;

    for (i, file) in collected.iter().enumerate() {
        let file_name = file
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        print!("[{}/{}] {}... ", i + 1, collected.len(), file_name);

        match engine.ingest_file(&file.path).await {
            Ok(doc) => {
                println!("완료 ({} 청크)", doc.chunk_count);
                success_count += 1;
            }
            Err(e) => {
                println!("실패: {}", e);
                error_count += 1;
            }
        }
    }

    println!("[OK] 인제스트 완료: 성공 {}, 실패 {}", success_count, error_count);
    Ok(())
}

/// 질의 결과 출력
fn print_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::EmptyQuery => {
            println!("[!] 빈 질문은 처리하지 않습니다.");
        }
        QueryOutcome::EmptyIndex => {
            println!("[!] 인덱스가 비어 있습니다. 먼저 문서를 인제스트하세요.");
        }
        QueryOutcome::Answered(result) => print_result(result),
    }
}

/// 답변 및 근거 출력
fn print_result(result: &QueryResult) {
    if result.degraded {
        println!("[!] 완성 서비스 호출 실패 - 폴백 답변입니다");
    }

    println!("\n{}\n", result.answer);
    println!("--- 근거 ({} 건) ---", result.sources.len());

    for (i, source) in result.sources.iter().enumerate() {
        println!(
            "{}. [점수: {:.4}] {} #청크{}",
            i + 1,
            source.score,
            source.record.doc_name,
            source.record.chunk_index
        );
        println!("   {}", truncate_text(&source.record.chunk_text, 200));
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }
}
