//! CLI 모듈
//!
//! kodoc-rag CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::chatbot::{ChatReply, ChatbotService};
use crate::config::AppConfig;
use crate::embedding::{has_api_key, EmbeddingProvider, GeminiEmbedding};
use crate::extractor::DocumentResource;
use crate::ingest::{load_default_document, IngestionPipeline, ProcessingResult};
use crate::knowledge::{LanceVectorStore, VectorStore};
use crate::llm::GeminiChat;
use crate::server::{self, AppState};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "kodoc-rag")]
#[command(version, about = "Kotlin 문서 RAG 챗봇", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP API 서버 기동
    Serve,

    /// 문서를 지식 베이스에 인제스트
    Ingest {
        /// 인제스트할 문서 경로 (PDF 또는 텍스트)
        file: PathBuf,
    },

    /// 지식 베이스에 질문 (단발성)
    Ask {
        /// 질문 내용
        question: String,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve => cmd_serve().await,
        Commands::Ingest { file } => cmd_ingest(file).await,
        Commands::Ask { question } => cmd_ask(&question).await,
        Commands::Status => cmd_status().await,
    }
}

// ============================================================================
// Service Wiring
// ============================================================================

/// 파이프라인 협력자 묶음
struct Services {
    config: AppConfig,
    embedder: Arc<GeminiEmbedding>,
    store: Arc<LanceVectorStore>,
}

/// 공통 서비스 초기화 (API 키 확인 포함)
async fn build_services() -> Result<Services> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\n\
             설정 방법:\n  \
             export GEMINI_API_KEY=your-api-key\n  \
             또는\n  \
             export GOOGLE_AI_API_KEY=your-api-key\n\n\
             API 키 발급: https://aistudio.google.com/app/apikey"
        );
    }

    let config = AppConfig::from_env();

    let embedder = GeminiEmbedding::from_env().context("GeminiEmbedding 초기화 실패")?;

    let store_path = config.data_dir.join("chunks.lance");
    let store = LanceVectorStore::open(&store_path)
        .await
        .context("LanceVectorStore 열기 실패")?;

    Ok(Services {
        config,
        embedder: Arc::new(embedder),
        store: Arc::new(store),
    })
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
///
/// 챗봇과 인제스트 파이프라인을 구성하고 HTTP API 서버를 기동합니다.
async fn cmd_serve() -> Result<()> {
    let services = build_services().await?;
    let Services {
        config,
        embedder,
        store,
    } = services;

    let model = GeminiChat::from_env().context("GeminiChat 초기화 실패")?;

    let chatbot = ChatbotService::from_config(
        &config,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        store.clone() as Arc<dyn VectorStore>,
        Arc::new(model),
    );

    // 부팅 시 기본 문서 자동 적재 (옵션)
    if config.auto_load_default_document {
        let pipeline = IngestionPipeline::from_config(
            &config,
            embedder.clone() as Arc<dyn EmbeddingProvider>,
            store.clone() as Arc<dyn VectorStore>,
        );
        load_default_document(&pipeline, &config.default_document_path).await;
    }

    let state = AppState::new(Arc::new(chatbot), store as Arc<dyn VectorStore>);
    server::serve(&config, state).await.context("서버 실행 실패")?;

    Ok(())
}

/// 인제스트 명령어 (ingest)
///
/// 문서를 읽어 청킹, 임베딩 후 벡터 저장소에 기록합니다.
async fn cmd_ingest(file: PathBuf) -> Result<()> {
    let services = build_services().await?;
    let Services {
        config,
        embedder,
        store,
    } = services;

    let pipeline = IngestionPipeline::from_config(
        &config,
        embedder as Arc<dyn EmbeddingProvider>,
        store.clone() as Arc<dyn VectorStore>,
    );

    println!("[*] 문서 처리 중: {}", file.display());

    let resource = DocumentResource::new(&file);
    match pipeline.ingest(&resource).await {
        ProcessingResult::Success {
            documents_processed,
            chunks_created,
            processing_time_ms,
        } => {
            println!("[OK] 인제스트 완료");
            println!("     문서(페이지): {}", documents_processed);
            println!("     청크: {}", chunks_created);
            println!("     소요 시간: {}ms", processing_time_ms);

            let total = store.count().await.context("청크 수 조회 실패")?;
            println!("     저장소 총 청크: {}", total);
        }
        ProcessingResult::Failure {
            processing_time_ms,
            message,
        } => {
            bail!("인제스트 실패 ({}ms): {}", processing_time_ms, message);
        }
    }

    Ok(())
}

/// 질문 명령어 (ask)
///
/// 서버 없이 단발성으로 쿼리 파이프라인을 실행합니다.
async fn cmd_ask(question: &str) -> Result<()> {
    let services = build_services().await?;
    let Services {
        config,
        embedder,
        store,
    } = services;

    let model = GeminiChat::from_env().context("GeminiChat 초기화 실패")?;

    let chatbot = ChatbotService::from_config(
        &config,
        embedder as Arc<dyn EmbeddingProvider>,
        store as Arc<dyn VectorStore>,
        Arc::new(model),
    );

    println!("[*] 질문: {}", question);
    println!();

    match chatbot.ask(question).await {
        ChatReply::Success {
            answer,
            confidence,
            context_documents,
            response_time_ms,
        } => {
            println!("{}", answer);
            println!();
            println!(
                "[OK] 신뢰도: {} | 컨텍스트 문서: {} | {}ms",
                confidence.as_str(),
                context_documents,
                response_time_ms
            );
        }
        ChatReply::Failure { message } => {
            println!("[!] {}", message);
        }
    }

    Ok(())
}

/// 상태 명령어 (status)
///
/// 시스템 상태를 확인합니다.
async fn cmd_status() -> Result<()> {
    println!("kodoc-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = AppConfig::from_env();
    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());
    println!(
        "[*] 서버 주소: {}:{}",
        config.server_host, config.server_port
    );

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    // 벡터 저장소 상태
    let store_path = config.data_dir.join("chunks.lance");
    match LanceVectorStore::open(&store_path).await {
        Ok(store) => match store.count().await {
            Ok(count) => {
                println!("[OK] 지식 베이스: {} 청크", count);
            }
            Err(e) => {
                println!("[!] 청크 수 조회 실패: {}", e);
            }
        },
        Err(e) => {
            println!("[!] 벡터 저장소 열기 실패: {}", e);
        }
    }

    Ok(())
}
