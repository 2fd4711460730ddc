//! 애플리케이션 설정 구조체.
//!
//! 스트림 엔드포인트, 연결 타임아웃, 결과 버퍼 용량 등 런타임 설정을 정의한다.
//! `ConfigManager`가 JSON 파일에서 로드하고, 환경변수/CLI 인자로 덮어쓴다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 기본 결과 버퍼 용량
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

/// 기본 API 엔드포인트
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// 기본 스트림 경로
pub const DEFAULT_STREAM_PATH: &str = "/api/stream";

/// 엔드포인트 덮어쓰기 환경변수
pub const ENV_API_URL: &str = "PINGPONG_API_URL";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 스트림 서버 연결 설정
    pub server: ServerConfig,
    /// 대시보드 엔진 설정
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// 스트림 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API 기본 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// SSE 스트림 경로 (`target` 쿼리 파라미터가 붙는다)
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    /// 연결 타임아웃 (밀리초)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ServerConfig {
    /// 연결 타임아웃을 Duration으로 반환
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

// ============================================================
// 대시보드 설정
// ============================================================

/// 대시보드 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 결과 버퍼 최대 용량 (최신 순으로 유지)
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// 시작 시 자동으로 모니터링할 대상
    #[serde(default)]
    pub default_target: Option<String>,
    /// 터미널 로그에 표시할 워커별 최근 항목 수
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            default_target: None,
            log_tail: default_log_tail(),
        }
    }
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }

    /// 프로세스 환경변수로 덮어쓰기
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 조회 함수로 환경변수 덮어쓰기 (빈 값은 무시)
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.server.base_url = url.trim().to_string();
        }
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let base = self.server.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::validation(
                "server.base_url",
                format!("http(s) URL이어야 합니다: {base:?}"),
            ));
        }
        if !self.server.stream_path.starts_with('/') {
            return Err(CoreError::validation(
                "server.stream_path",
                "'/'로 시작해야 합니다",
            ));
        }
        if self.dashboard.buffer_capacity == 0 {
            return Err(CoreError::validation(
                "dashboard.buffer_capacity",
                "1 이상이어야 합니다",
            ));
        }
        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_stream_path() -> String {
    DEFAULT_STREAM_PATH.to_string()
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}
fn default_log_tail() -> usize {
    5
}
