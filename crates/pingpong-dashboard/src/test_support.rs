//! 테스트 헬퍼 — 결과 생성기와 인메모리 전송 계층.

use chrono::Utc;
use pingpong_core::error::CoreError;
use pingpong_core::models::ping::{Metrics, PingResult};
use pingpong_core::ports::transport::{StreamHandle, StreamId, StreamRequest, StreamTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// 워커/성공 여부/전체 지연으로 결과 생성
pub fn make_result(worker_id: &str, success: bool, total_ms: f64) -> PingResult {
    PingResult {
        session_id: "req_test".to_string(),
        worker_id: worker_id.to_string(),
        timestamp: Utc::now(),
        success,
        metrics: Some(if success {
            Metrics {
                dns_ms: 10.0,
                tcp_ms: 20.0,
                tls_ms: 30.0,
                ttfb_ms: 40.0,
                total_ms,
            }
        } else {
            Metrics::default()
        }),
        error: (!success).then(|| format!("{worker_id} 타임아웃")),
    }
}

/// 결과를 와이어 JSON으로
pub fn to_wire(result: &PingResult) -> String {
    serde_json::to_string(result).unwrap()
}

/// 열린 핸들 기록
pub struct OpenedStream {
    pub request: StreamRequest,
    pub closed: Arc<AtomicBool>,
}

/// 인메모리 전송 계층
#[derive(Default)]
pub struct MockTransport {
    pub opened: Mutex<Vec<OpenedStream>>,
    pub refuse: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// 닫히지 않은 핸들 수
    pub fn live_count(&self) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.closed.load(Ordering::SeqCst))
            .count()
    }

    pub fn target(&self, index: usize) -> String {
        let opened = self.opened.lock().unwrap();
        opened[index].request.target_url.clone()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        let opened = self.opened.lock().unwrap();
        opened[index].closed.load(Ordering::SeqCst)
    }

    pub fn request(&self, index: usize) -> StreamRequest {
        let opened = self.opened.lock().unwrap();
        opened[index].request.clone()
    }
}

impl StreamTransport for MockTransport {
    fn open(&self, request: StreamRequest) -> Result<Box<dyn StreamHandle>, CoreError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(CoreError::Network("연결 거부".to_string()));
        }
        let closed = Arc::new(AtomicBool::new(false));
        let handle = MockHandle {
            stream_id: request.stream_id,
            closed: closed.clone(),
        };
        self.opened
            .lock()
            .unwrap()
            .push(OpenedStream { request, closed });
        Ok(Box::new(handle))
    }
}

struct MockHandle {
    stream_id: StreamId,
    closed: Arc<AtomicBool>,
}

impl StreamHandle for MockHandle {
    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.close();
    }
}
