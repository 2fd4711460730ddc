//! 집계 통계 계산.
//!
//! 결과 시퀀스(버퍼 전체 또는 워커 분할)에서 성공률과 지연 통계를 계산한다.
//! 호출할 때마다 다시 계산하며 증분으로 유지하지 않는다.

use pingpong_core::models::ping::PingResult;
use pingpong_core::models::session::{Aggregate, PhaseAverages};

/// 결과 시퀀스 집계
///
/// 지연 통계는 성공 결과의 `total_ms`만 사용한다.
/// `latest_error`는 시퀀스에서 처음 만나는 실패 사유다 (버퍼는 최신 순).
pub fn aggregate<'a, I>(results: I) -> Aggregate
where
    I: IntoIterator<Item = &'a PingResult>,
{
    let mut count = 0usize;
    let mut success_count = 0usize;
    let mut samples = 0usize;
    let mut total_sum = 0.0f64;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    let mut phase_sum = PhaseAverages::default();
    let mut latest_error: Option<String> = None;

    for result in results {
        count += 1;

        if !result.success {
            if latest_error.is_none() {
                latest_error = result.failure_reason().map(str::to_string);
            }
            continue;
        }

        success_count += 1;
        let Some(metrics) = result.metrics else {
            continue;
        };

        samples += 1;
        total_sum += metrics.total_ms;
        min = Some(min.map_or(metrics.total_ms, |m| m.min(metrics.total_ms)));
        max = Some(max.map_or(metrics.total_ms, |m| m.max(metrics.total_ms)));
        phase_sum.dns_ms += metrics.dns_ms;
        phase_sum.tcp_ms += metrics.tcp_ms;
        phase_sum.tls_ms += metrics.tls_ms;
        phase_sum.ttfb_ms += metrics.ttfb_ms;
    }

    let success_rate = if count == 0 {
        100.0
    } else {
        success_count as f64 / count as f64 * 100.0
    };

    let (avg_latency_ms, phases) = if samples == 0 {
        (0.0, None)
    } else {
        let n = samples as f64;
        (
            total_sum / n,
            Some(PhaseAverages {
                dns_ms: phase_sum.dns_ms / n,
                tcp_ms: phase_sum.tcp_ms / n,
                tls_ms: phase_sum.tls_ms / n,
                ttfb_ms: phase_sum.ttfb_ms / n,
            }),
        )
    };

    Aggregate {
        count,
        success_count,
        failure_count: count - success_count,
        success_rate,
        avg_latency_ms,
        min_latency_ms: min,
        max_latency_ms: max,
        phases,
        latest_error,
    }
}
