//! 터미널 대시보드 프레젠터.
//!
//! 스냅샷이 발행될 때마다 직전 렌더 상태와 비교하여
//! 상태 변화와 새로 도착한 결과만 출력한다.

use parking_lot::Mutex;
use pingpong_core::models::ping::{Metrics, Phase, PingResult};
use pingpong_core::models::session::{Aggregate, SessionSnapshot, SessionStatus};
use pingpong_core::ports::presenter::SnapshotPresenter;
use pingpong_dashboard::partition::partition;

/// 이 값 미만이면 빠름 (밀리초)
const FAST_THRESHOLD_MS: f64 = 100.0;

/// 이 값 미만이면 보통 (밀리초)
const SLOW_THRESHOLD_MS: f64 = 300.0;

/// 지연 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyClass {
    Fast,
    Moderate,
    Slow,
}

impl LatencyClass {
    pub fn of(latency_ms: f64) -> Self {
        if latency_ms < FAST_THRESHOLD_MS {
            LatencyClass::Fast
        } else if latency_ms < SLOW_THRESHOLD_MS {
            LatencyClass::Moderate
        } else {
            LatencyClass::Slow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LatencyClass::Fast => "빠름",
            LatencyClass::Moderate => "보통",
            LatencyClass::Slow => "느림",
        }
    }
}

/// 직전 렌더 상태
#[derive(Default)]
struct RenderState {
    status: SessionStatus,
    target_url: String,
    received: u64,
    dropped_messages: u64,
}

/// 표준 출력 프레젠터
#[derive(Default)]
pub struct TerminalPresenter {
    state: Mutex<RenderState>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 직전 렌더 이후 달라진 부분을 출력 줄로 계산하고 렌더 상태 갱신
    pub fn render_lines(&self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut state = self.state.lock();
        let mut lines = Vec::new();

        let status_changed = snapshot.status != state.status;
        if status_changed || snapshot.target_url != state.target_url {
            lines.push(status_line(snapshot));
        }

        // 버퍼는 최신 순: 앞쪽 `fresh`건이 직전 렌더 이후 도착한 결과
        let arrived = snapshot.received.saturating_sub(state.received);
        let fresh = usize::try_from(arrived)
            .unwrap_or(usize::MAX)
            .min(snapshot.results.len());
        lines.extend(snapshot.results[..fresh].iter().rev().map(format_result));

        // start마다 0부터 다시 센다
        let dropped_before = if snapshot.dropped_messages < state.dropped_messages {
            0
        } else {
            state.dropped_messages
        };
        if snapshot.dropped_messages > dropped_before {
            lines.push(format!(
                "! 비정상 메시지 {}건 무시됨",
                snapshot.dropped_messages - dropped_before
            ));
        }

        if status_changed
            && matches!(
                snapshot.status,
                SessionStatus::Completed | SessionStatus::Error
            )
        {
            lines.extend(summary_lines(snapshot));
        }

        state.status = snapshot.status;
        state.target_url.clone_from(&snapshot.target_url);
        state.received = snapshot.received;
        state.dropped_messages = snapshot.dropped_messages;
        lines
    }
}

impl SnapshotPresenter for TerminalPresenter {
    fn render(&self, snapshot: &SessionSnapshot) {
        for line in self.render_lines(snapshot) {
            println!("{line}");
        }
    }
}

/// 세션 상태 한 줄
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let target = &snapshot.target_url;
    match snapshot.status {
        SessionStatus::Idle => "● 대기 중".to_string(),
        SessionStatus::Connected => format!("● 연결됨: {target}"),
        SessionStatus::Completed => format!("● 완료: {target}"),
        SessionStatus::Error => format!("● 연결 오류: {target} (start 명령으로 다시 시작)"),
    }
}

/// 결과 한 줄
pub fn format_result(result: &PingResult) -> String {
    let time = result.timestamp.format("%H:%M:%S");
    if let Some(reason) = result.failure_reason() {
        return format!("[{}] {time} 실패 {reason}", result.worker_id);
    }

    match result.metrics {
        Some(metrics) => {
            let phases = Phase::ALL
                .iter()
                .map(|p| format_phase(&metrics, *p))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "[{}] {time} 성공 {:.1}ms ({}) {phases}",
                result.worker_id,
                metrics.total_ms,
                LatencyClass::of(metrics.total_ms).label()
            )
        }
        None => format!("[{}] {time} 성공", result.worker_id),
    }
}

/// 단계 지연과 전체 대비 비율. 전체가 0이면 비율 생략
fn format_phase(metrics: &Metrics, phase: Phase) -> String {
    let ms = metrics.phase(phase);
    match metrics.phase_share(phase) {
        Some(share) => format!("{} {ms:.1} ({:.0}%)", phase.label(), share * 100.0),
        None => format!("{} {ms:.1}", phase.label()),
    }
}

fn format_aggregate(aggregate: &Aggregate) -> String {
    let mut line = format!(
        "{}건, 업타임 {:.1}%",
        aggregate.count, aggregate.success_rate
    );
    if aggregate.has_latency() {
        line.push_str(&format!(", 평균 {:.1}ms", aggregate.avg_latency_ms));
        if let (Some(min), Some(max)) = (aggregate.min_latency_ms, aggregate.max_latency_ms) {
            line.push_str(&format!(" (최소 {min:.1} / 최대 {max:.1})"));
        }
    }
    line
}

/// 전체 및 워커별 요약
pub fn summary_lines(snapshot: &SessionSnapshot) -> Vec<String> {
    if snapshot.results.is_empty() {
        return vec!["수신된 결과 없음".to_string()];
    }

    let mut lines = vec![format!("전체: {}", format_aggregate(&snapshot.overall))];
    for (worker, aggregate) in snapshot.worker_metrics() {
        lines.push(format!("  {worker}: {}", format_aggregate(aggregate)));
        if let Some(error) = &aggregate.latest_error {
            lines.push(format!("    최근 실패: {error}"));
        }
    }
    lines
}

/// 워커별 최근 결과 (워커당 최대 `tail`건)
pub fn worker_lines(snapshot: &SessionSnapshot, tail: usize) -> Vec<String> {
    if snapshot.workers.is_empty() {
        return vec!["워커 없음".to_string()];
    }

    let mut lines = Vec::new();
    for (worker, aggregate) in snapshot.worker_metrics() {
        lines.push(format!("{worker} ({})", format_aggregate(aggregate)));
        lines.extend(
            partition(&snapshot.results, worker)
                .into_iter()
                .take(tail)
                .map(|r| format!("  {}", format_result(r))),
        );
    }
    lines
}
