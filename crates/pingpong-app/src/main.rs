//! # pingpong-app
//!
//! PingPong 대시보드 바이너리 진입점.
//! 설정 로드, 전송 계층 연결, 터미널 프레젠터 등록, 라이프사이클 관리.

mod console;
mod lifecycle;
mod terminal;

use anyhow::Result;
use clap::Parser;
use pingpong_core::config::AppConfig;
use pingpong_core::config_manager::ConfigManager;
use pingpong_dashboard::runner::DashboardRunner;
use pingpong_network::sse_client::SseStreamTransport;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleExit;
use crate::lifecycle::LifecycleManager;
use crate::terminal::{status_line, summary_lines, TerminalPresenter};

/// PingPong 지연 모니터링 대시보드
///
/// 원격 워커들의 DNS/TCP/TLS/TTFB 측정 스트림을 실시간으로 집계한다.
#[derive(Parser, Debug)]
#[command(name = "pingpong")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API 서버 URL (기본: http://localhost:8080)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 시작하자마자 모니터링할 대상 URL
    #[arg(long, short = 't')]
    target: Option<String>,

    /// 결과 버퍼 용량
    #[arg(long, short = 'c')]
    capacity: Option<usize>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// 설정 로드 (파일 → 환경변수 → CLI 순으로 덮어쓰기)
fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::open(path),
        None => ConfigManager::open_default(),
    };

    let mut config = match manager {
        Ok(manager) => {
            info!("설정 파일: {}", manager.path().display());
            manager.config().clone()
        }
        Err(e) => {
            warn!("설정 파일 로드 실패, 기본값 사용: {e}");
            AppConfig::default_config()
        }
    };

    config.apply_env_overrides();
    apply_cli_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(server_url) = &args.server {
        config.server.base_url = server_url.clone();
    }
    if let Some(capacity) = args.capacity {
        config.dashboard.buffer_capacity = capacity;
    }
    if let Some(target) = &args.target {
        config.dashboard.default_target = Some(target.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "pingpong={lvl},pingpong_app={lvl},pingpong_core={lvl},pingpong_dashboard={lvl},pingpong_network={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("PingPong 대시보드 시작");

    let config = load_config(&args)?;
    info!(
        "서버: {}{} (버퍼 {}건)",
        config.server.base_url, config.server.stream_path, config.dashboard.buffer_capacity
    );

    let transport = Arc::new(SseStreamTransport::from_config(&config.server)?);
    let (runner, handle) = DashboardRunner::new(transport, config.dashboard.buffer_capacity);
    let runner = runner.with_presenter(Arc::new(TerminalPresenter::new()));

    let lifecycle = Arc::new(LifecycleManager::new());
    let runner_task = tokio::spawn(runner.run(lifecycle.subscribe()));

    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_lifecycle.wait_for_signal().await {
            error!("시그널 핸들러 등록 실패: {e}");
        }
    });

    if let Some(target) = &config.dashboard.default_target {
        if let Err(e) = handle.start(target).await {
            warn!("초기 대상 시작 실패: {e}");
        }
    } else {
        println!("start <url> 로 모니터링을 시작하세요 (help: 명령 목록)");
    }

    let exit = console::run(
        handle.clone(),
        lifecycle.subscribe(),
        config.dashboard.log_tail,
    )
    .await;
    if exit == ConsoleExit::Eof && !lifecycle.is_shutting_down() {
        // 입력이 없어도 스트림은 시그널까지 유지
        let mut shutdown_rx = lifecycle.subscribe();
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    }

    lifecycle.shutdown();
    runner_task.await?;

    let snapshot = handle.snapshot();
    println!("{}", status_line(&snapshot));
    for line in summary_lines(&snapshot) {
        println!("{line}");
    }

    info!("PingPong 대시보드 종료");
    Ok(())
}
