//! 대시보드 세션 상태 모델.
//!
//! 세션 상태 enum, 집계 통계, 프레젠테이션 계층에 전달하는 읽기 전용 스냅샷.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::ping::PingResult;

/// 세션 연결 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// 시작 전
    #[default]
    Idle,
    /// 스트림 수신 중
    Connected,
    /// 종료 신호 수신 또는 사용자 중지
    Completed,
    /// 전송 계층 실패 (수동 재시작 필요)
    Error,
}

impl SessionStatus {
    /// 표시용 라벨
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connected => "connected",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }

    /// 스트림이 살아있는 상태인지
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Connected)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 성공 결과의 단계별 평균 지연 (밀리초)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAverages {
    pub dns_ms: f64,
    pub tcp_ms: f64,
    pub tls_ms: f64,
    pub ttfb_ms: f64,
}

/// 결과 시퀀스의 집계 통계
///
/// 지연 통계는 성공 결과의 `total_ms`만 대상으로 한다.
/// `min_latency_ms`/`max_latency_ms`는 성공 결과가 없으면 None.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 성공률 (%). 결과가 없으면 100
    pub success_rate: f64,
    /// 평균 지연. 성공 결과가 없으면 0
    pub avg_latency_ms: f64,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    /// 단계별 평균. 성공 결과가 없으면 None
    pub phases: Option<PhaseAverages>,
    /// 시퀀스 내 가장 최근 실패 사유
    pub latest_error: Option<String>,
}

impl Aggregate {
    /// 빈 시퀀스의 집계
    pub fn empty() -> Self {
        Self {
            count: 0,
            success_count: 0,
            failure_count: 0,
            success_rate: 100.0,
            avg_latency_ms: 0.0,
            min_latency_ms: None,
            max_latency_ms: None,
            phases: None,
            latest_error: None,
        }
    }

    /// 지연 통계를 읽을 수 있는지
    pub fn has_latency(&self) -> bool {
        self.success_count > 0
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::empty()
    }
}

/// 프레젠테이션 계층용 읽기 전용 스냅샷
///
/// 버퍼로부터 매번 다시 계산되며 버퍼와 독립적으로 변경되지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// 마지막으로 확정된(정규화된) 대상 URL
    pub target_url: String,
    /// 버퍼 내용 (최신 순)
    pub results: Vec<PingResult>,
    /// 첫 등장 순 워커 ID 목록
    pub workers: Vec<String>,
    pub metrics_by_worker: HashMap<String, Aggregate>,
    /// 버퍼 전체 집계
    pub overall: Aggregate,
    /// 마지막 start 이후 버려진 비정상 메시지 수
    pub dropped_messages: u64,
    /// 세션 생성 이후 버퍼에 들어온 결과 누계. start에도 초기화되지 않는다
    pub received: u64,
}

impl SessionSnapshot {
    /// 워커 집계 조회 (워커 목록 순서 유지)
    pub fn worker_metrics(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
        self.workers.iter().filter_map(|w| {
            self.metrics_by_worker
                .get(w)
                .map(|aggregate| (w.as_str(), aggregate))
        })
    }
}
