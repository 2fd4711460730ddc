//! 프로브 결과 모델.
//!
//! 워커가 측정한 DNS/TCP/TLS/TTFB/전체 지연 시간과 종료 신호.
//! 와이어 필드명은 camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 종료 신호의 status 값
pub const STATUS_COMPLETED: &str = "completed";

/// 측정 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Dns,
    Tcp,
    Tls,
    Ttfb,
}

impl Phase {
    /// 전체 단계 (측정 순서)
    pub const ALL: [Phase; 4] = [Phase::Dns, Phase::Tcp, Phase::Tls, Phase::Ttfb];

    /// 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Dns => "DNS",
            Phase::Tcp => "TCP",
            Phase::Tls => "TLS",
            Phase::Ttfb => "TTFB",
        }
    }
}

/// 단계별 지연 시간 (밀리초)
///
/// `total_ms`는 단계 합 이상으로 기대되지만 상위 데이터가 이를 지키지 않을 수
/// 있다. 단계 값으로 `total_ms`를 다시 계산하지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub dns_ms: f64,
    pub tcp_ms: f64,
    pub tls_ms: f64,
    pub ttfb_ms: f64,
    pub total_ms: f64,
}

impl Metrics {
    /// 특정 단계 값
    pub fn phase(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Dns => self.dns_ms,
            Phase::Tcp => self.tcp_ms,
            Phase::Tls => self.tls_ms,
            Phase::Ttfb => self.ttfb_ms,
        }
    }

    /// 네 단계의 합
    pub fn phase_sum(&self) -> f64 {
        Phase::ALL.iter().map(|p| self.phase(*p)).sum()
    }

    /// 전체 시간 대비 단계 비율 (0.0~). `total_ms == 0`이면 None
    pub fn phase_share(&self, phase: Phase) -> Option<f64> {
        if self.total_ms <= 0.0 {
            return None;
        }
        Some(self.phase(phase) / self.total_ms)
    }

    /// 모든 값이 유한한 0 이상의 수인지
    pub fn is_valid(&self) -> bool {
        [
            self.dns_ms,
            self.tcp_ms,
            self.tls_ms,
            self.ttfb_ms,
            self.total_ms,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// 단일 프로브 결과. 생성 후 변경하지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    /// 모니터링 실행 단위 ID
    pub session_id: String,
    /// 결과를 만든 워커 ID
    pub worker_id: String,
    /// 프로브 완료 시각 (표시용, 버퍼 순서는 도착 순)
    pub timestamp: DateTime<Utc>,
    /// 프로브 성공 여부
    pub success: bool,
    /// 측정값 (success일 때만 의미 있음)
    #[serde(default)]
    pub metrics: Option<Metrics>,
    /// 실패 사유 (실패일 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PingResult {
    /// 성공 결과의 전체 지연 시간
    pub fn latency_ms(&self) -> Option<f64> {
        if !self.success {
            return None;
        }
        self.metrics.map(|m| m.total_ms)
    }

    /// 실패 결과의 표시용 사유
    pub fn failure_reason(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        Some(self.error.as_deref().unwrap_or("Failed"))
    }
}

/// 스트림 제어 신호 (`{"status": "completed"}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

impl StatusUpdate {
    /// 종료 신호인지
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// 디코딩된 스트림 메시지
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// 프로브 결과
    Result(PingResult),
    /// 종료 신호
    Completed,
}
