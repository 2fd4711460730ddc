//! 대시보드 세션 상태 머신.
//!
//! idle → connected → completed/error. 세션은 전송 핸들을 최대 하나만 소유하며,
//! 현재 핸들이 아닌 스트림에서 온 이벤트는 버린다.
//! 모든 변경은 `&mut self` 메서드 안에서 하나씩 처리된다.

use pingpong_core::error::CoreError;
use pingpong_core::models::ping::StreamMessage;
use pingpong_core::models::session::{SessionSnapshot, SessionStatus};
use pingpong_core::ports::transport::{
    StreamHandle, StreamId, StreamRequest, StreamTransport, TransportEvent, TransportEventKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::buffer::ResultBuffer;
use crate::decoder::decode;
use crate::partition::partition_all;

/// 기본 스킴 (스킴이 없는 대상에 붙인다)
const DEFAULT_SCHEME: &str = "https://";

/// 대상 URL 정규화
///
/// 앞뒤 공백을 제거하고, `http://`/`https://`가 없으면 `https://`를 붙인다.
/// 빈 대상은 None.
pub fn normalize_target(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("{DEFAULT_SCHEME}{trimmed}"))
    }
}

/// 모니터링 세션
pub struct DashboardSession {
    transport: Arc<dyn StreamTransport>,
    events_tx: mpsc::Sender<TransportEvent>,
    target_url: String,
    status: SessionStatus,
    buffer: ResultBuffer,
    handle: Option<Box<dyn StreamHandle>>,
    next_stream_id: u64,
    dropped_messages: u64,
    received: u64,
}

impl DashboardSession {
    /// 새 세션 생성 (idle)
    ///
    /// 전송 계층이 여는 스트림의 이벤트는 `events_tx`로 들어온다.
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        buffer_capacity: usize,
        events_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            transport,
            events_tx,
            target_url: String::new(),
            status: SessionStatus::Idle,
            buffer: ResultBuffer::new(buffer_capacity),
            handle: None,
            next_stream_id: 0,
            dropped_messages: 0,
            received: 0,
        }
    }

    /// 현재 상태
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// 마지막으로 확정된 대상 URL
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// 결과 버퍼 (읽기 전용)
    pub fn buffer(&self) -> &ResultBuffer {
        &self.buffer
    }

    /// 현재 살아있는 스트림 ID
    pub fn current_stream(&self) -> Option<StreamId> {
        self.handle.as_ref().map(|h| h.stream_id())
    }

    /// 열린 핸들이 있는지
    pub fn has_live_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// 마지막 start 이후 버린 비정상 메시지 수
    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages
    }

    /// 새 스트림 시작
    ///
    /// 빈 대상은 핸들을 열기 전에 거부되며 상태는 바뀌지 않는다.
    /// 기존 핸들을 먼저 닫고 버퍼를 비운 뒤 새 핸들을 연다.
    /// 전송 계층이 열기를 거부하면 상태는 error가 된다.
    pub fn start(&mut self, raw_target: &str) -> Result<StreamId, CoreError> {
        let Some(target) = normalize_target(raw_target) else {
            return Err(CoreError::validation(
                "target_url",
                "모니터링 대상이 비어 있습니다",
            ));
        };

        self.close_handle();
        self.buffer.clear();
        self.dropped_messages = 0;
        self.target_url = target.clone();

        self.next_stream_id += 1;
        let stream_id = StreamId(self.next_stream_id);
        let request = StreamRequest {
            stream_id,
            target_url: target,
            events: self.events_tx.clone(),
        };

        match self.transport.open(request) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.status = SessionStatus::Connected;
                info!("스트림 시작: {} ({stream_id})", self.target_url);
                Ok(stream_id)
            }
            Err(e) => {
                self.status = SessionStatus::Error;
                warn!("스트림 열기 실패: {} — {e}", self.target_url);
                Err(e)
            }
        }
    }

    /// 사용자 중지
    ///
    /// 열린 핸들이 없으면 아무것도 하지 않는다. 상태가 바뀌었으면 true.
    pub fn stop(&mut self) -> bool {
        if self.handle.is_none() {
            debug!("중지 요청 무시: 열린 스트림 없음 (status={})", self.status);
            return false;
        }

        self.close_handle();
        self.status = SessionStatus::Completed;
        info!("스트림 중지: {}", self.target_url);
        true
    }

    /// 전송 계층 이벤트 처리. 스냅샷이 바뀌었으면 true
    pub fn handle_event(&mut self, event: TransportEvent) -> bool {
        if self.current_stream() != Some(event.stream_id) {
            debug!("지난 스트림 이벤트 폐기: {}", event.stream_id);
            return false;
        }

        match event.kind {
            TransportEventKind::Opened => {
                debug!("스트림 연결 수립: {}", event.stream_id);
                false
            }
            TransportEventKind::Message(payload) => self.handle_message(&payload),
            TransportEventKind::Failed(reason) => {
                warn!("스트림 실패: {reason}");
                self.close_handle();
                self.status = SessionStatus::Error;
                true
            }
            TransportEventKind::Closed => {
                warn!("종료 신호 없이 스트림이 닫힘: {}", self.target_url);
                self.close_handle();
                self.status = SessionStatus::Error;
                true
            }
        }
    }

    fn handle_message(&mut self, payload: &str) -> bool {
        match decode(payload) {
            Ok(StreamMessage::Result(result)) => {
                debug!(
                    "결과 수신: worker={} success={}",
                    result.worker_id, result.success
                );
                self.buffer.push(result);
                self.received += 1;
                true
            }
            Ok(StreamMessage::Completed) => {
                info!(
                    "스트림 완료: {} (결과 {}건)",
                    self.target_url,
                    self.buffer.len()
                );
                self.close_handle();
                self.status = SessionStatus::Completed;
                true
            }
            Err(e) => {
                self.dropped_messages += 1;
                warn!("비정상 메시지 폐기: {e}");
                true
            }
        }
    }

    /// 세션 정리. 열린 핸들을 무조건 닫는다.
    pub fn dispose(&mut self) {
        if self.handle.is_some() {
            info!("세션 정리: 스트림 닫기");
        }
        self.close_handle();
    }

    fn close_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
            debug!("핸들 닫힘: {}", handle.stream_id());
        }
    }

    /// 현재 버퍼에서 스냅샷 계산
    pub fn snapshot(&self) -> SessionSnapshot {
        let partitions = partition_all(&self.buffer);

        let mut workers = Vec::with_capacity(partitions.len());
        let mut metrics_by_worker = HashMap::with_capacity(partitions.len());
        for p in partitions {
            metrics_by_worker.insert(
                p.worker_id.to_string(),
                aggregate(p.results.iter().copied()),
            );
            workers.push(p.worker_id.to_string());
        }

        SessionSnapshot {
            status: self.status,
            target_url: self.target_url.clone(),
            results: self.buffer.to_vec(),
            workers,
            metrics_by_worker,
            overall: aggregate(&self.buffer),
            dropped_messages: self.dropped_messages,
            received: self.received,
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_result, to_wire, MockTransport};
    use std::sync::atomic::Ordering;

    fn session_with(transport: &Arc<MockTransport>, capacity: usize) -> DashboardSession {
        let (tx, _rx) = mpsc::channel(8);
        DashboardSession::new(transport.clone(), capacity, tx)
    }

    fn message(id: StreamId, payload: String) -> TransportEvent {
        TransportEvent::new(id, TransportEventKind::Message(payload))
    }

    fn completed(id: StreamId) -> TransportEvent {
        message(id, r#"{"status":"completed"}"#.to_string())
    }

    #[test]
    fn normalize_adds_https() {
        assert_eq!(
            normalize_target("example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_target("  example.com/health \n").as_deref(),
            Some("https://example.com/health")
        );
    }

    #[test]
    fn normalize_keeps_existing_scheme() {
        assert_eq!(
            normalize_target("http://example.com").as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            normalize_target("HTTPS://Example.com").as_deref(),
            Some("HTTPS://Example.com")
        );
    }

    #[test]
    fn normalize_rejects_blank() {
        assert!(normalize_target("").is_none());
        assert!(normalize_target("   ").is_none());
    }

    #[test]
    fn new_session_is_idle() {
        let transport = MockTransport::new();
        let session = session_with(&transport, 10);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(!session.has_live_handle());
        assert!(session.buffer().is_empty());
        assert_eq!(transport.open_count(), 0);
    }

    #[test]
    fn start_normalizes_and_connects() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);

        session.start("example.com").unwrap();

        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.target_url(), "https://example.com");
        assert_eq!(transport.target(0), "https://example.com");
        assert_eq!(transport.live_count(), 1);
    }

    #[test]
    fn empty_target_rejected_without_state_change() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);

        let err = session.start("   ").unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(transport.open_count(), 0);
    }

    #[test]
    fn empty_target_keeps_running_stream() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();
        session.handle_event(message(id, to_wire(&make_result("a", true, 10.0))));

        assert!(session.start("").is_err());
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.buffer().len(), 1);
        assert_eq!(transport.live_count(), 1);
    }

    #[test]
    fn restart_leaves_exactly_one_handle() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);

        let first = session.start("one.example").unwrap();
        session.handle_event(message(first, to_wire(&make_result("a", true, 10.0))));
        let second = session.start("two.example").unwrap();

        assert_ne!(first, second);
        assert_eq!(transport.open_count(), 2);
        assert!(transport.is_closed(0));
        assert_eq!(transport.live_count(), 1);
        assert!(session.buffer().is_empty());

        // 이전 스트림의 늦은 이벤트는 무시
        let late = message(first, to_wire(&make_result("a", true, 10.0)));
        assert!(!session.handle_event(late));
        let fresh = message(second, to_wire(&make_result("b", true, 20.0)));
        assert!(session.handle_event(fresh));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.workers, vec!["b"]);
        assert_eq!(snapshot.results.len(), 1);
    }

    #[test]
    fn received_counts_every_arrival_across_restarts() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 2);

        let first = session.start("one.example").unwrap();
        let same = to_wire(&make_result("a", true, 10.0));
        session.handle_event(message(first, same.clone()));
        session.handle_event(message(first, same));
        session.handle_event(message(first, "not json".to_string()));
        assert_eq!(session.snapshot().received, 2);

        let second = session.start("two.example").unwrap();
        assert_eq!(session.snapshot().received, 2);

        // 버퍼 용량을 넘어도 누계는 계속 증가
        for n in 0..3 {
            session.handle_event(message(second, to_wire(&make_result("b", true, n as f64))));
        }
        let snapshot = session.snapshot();
        assert_eq!(snapshot.received, 5);
        assert_eq!(snapshot.results.len(), 2);
    }

    #[test]
    fn results_are_buffered_without_transition() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();

        let opened = TransportEvent::new(id, TransportEventKind::Opened);
        assert!(!session.handle_event(opened));
        let ok = message(id, to_wire(&make_result("a", true, 10.0)));
        assert!(session.handle_event(ok));
        let failed = message(id, to_wire(&make_result("a", false, 0.0)));
        assert!(session.handle_event(failed));

        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.buffer().len(), 2);
        assert!(!session.buffer().latest().unwrap().success);
    }

    #[test]
    fn buffer_capacity_applies() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 3);
        let id = session.start("example.com").unwrap();

        for n in 0..10 {
            session.handle_event(message(id, to_wire(&make_result("a", true, n as f64))));
        }

        let totals: Vec<f64> = session
            .buffer()
            .iter()
            .filter_map(|r| r.latency_ms())
            .collect();
        assert_eq!(totals, vec![9.0, 8.0, 7.0]);
    }

    #[test]
    fn completed_signal_closes_and_freezes_buffer() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();
        session.handle_event(message(id, to_wire(&make_result("a", true, 10.0))));

        assert!(session.handle_event(completed(id)));
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(transport.is_closed(0));
        assert!(!session.has_live_handle());

        let late = message(id, to_wire(&make_result("a", true, 99.0)));
        assert!(!session.handle_event(late));
        assert_eq!(session.buffer().len(), 1);
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn transport_failure_sets_error() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();

        assert!(session.handle_event(TransportEvent::new(
            id,
            TransportEventKind::Failed("connection reset".to_string())
        )));
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(transport.is_closed(0));
        assert_eq!(transport.open_count(), 1);
    }

    #[test]
    fn close_without_terminal_signal_is_error() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();

        session.handle_event(TransportEvent::new(id, TransportEventKind::Closed));
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(!session.has_live_handle());
    }

    #[test]
    fn error_is_retryable_by_start() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();
        session.handle_event(TransportEvent::new(id, TransportEventKind::Closed));

        session.start("example.com").unwrap();
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(transport.live_count(), 1);
    }

    #[test]
    fn decode_anomaly_is_not_fatal() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();

        // 버려진 건수도 스냅샷에 포함되므로 발행 대상
        assert!(session.handle_event(message(id, "not json".to_string())));
        let running = message(id, r#"{"status":"running"}"#.to_string());
        assert!(session.handle_event(running));
        assert!(session.buffer().is_empty());
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.dropped_messages(), 2);
        assert!(session.has_live_handle());

        session.start("example.com").unwrap();
        assert_eq!(session.dropped_messages(), 0);
    }

    #[test]
    fn stop_in_idle_is_noop() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);

        assert!(!session.stop());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn stop_closes_and_completes() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        session.start("example.com").unwrap();

        assert!(session.stop());
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(transport.is_closed(0));

        // 멱등
        assert!(!session.stop());
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn stop_after_error_keeps_error() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();
        session.handle_event(TransportEvent::new(id, TransportEventKind::Closed));

        assert!(!session.stop());
        assert_eq!(session.status(), SessionStatus::Error);
    }

    #[test]
    fn refused_open_sets_error() {
        let transport = MockTransport::new();
        transport.refuse.store(true, Ordering::SeqCst);
        let mut session = session_with(&transport, 10);

        let err = session.start("example.com").unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(!session.has_live_handle());
        assert_eq!(session.target_url(), "https://example.com");
    }

    #[test]
    fn drop_closes_handle() {
        let transport = MockTransport::new();
        {
            let mut session = session_with(&transport, 10);
            session.start("example.com").unwrap();
            assert_eq!(transport.live_count(), 1);
        }
        assert_eq!(transport.live_count(), 0);
    }

    #[test]
    fn snapshot_partitions_and_aggregates() {
        let transport = MockTransport::new();
        let mut session = session_with(&transport, 10);
        let id = session.start("example.com").unwrap();

        session.handle_event(message(id, to_wire(&make_result("a", true, 100.0))));
        session.handle_event(message(id, to_wire(&make_result("b", false, 0.0))));
        session.handle_event(message(id, to_wire(&make_result("a", true, 300.0))));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Connected);
        assert_eq!(snapshot.target_url, "https://example.com");
        assert_eq!(snapshot.results.len(), 3);
        // 최신 순이므로 a가 먼저 등장
        assert_eq!(snapshot.workers, vec!["a", "b"]);

        let a = &snapshot.metrics_by_worker["a"];
        assert_eq!(a.count, 2);
        assert_eq!(a.avg_latency_ms, 200.0);
        let b = &snapshot.metrics_by_worker["b"];
        assert_eq!(b.success_rate, 0.0);
        assert!(b.latest_error.is_some());

        assert_eq!(snapshot.overall.count, 3);
        assert!((snapshot.overall.success_rate - 66.666).abs() < 0.1);
    }
}
