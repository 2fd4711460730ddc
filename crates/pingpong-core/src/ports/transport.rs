//! 텔레메트리 스트림 전송 포트.
//!
//! 구현: `pingpong-network` crate (reqwest + eventsource-stream)

use tokio::sync::mpsc;

use crate::error::CoreError;

/// 스트림 핸들 식별자. 세션이 열 때마다 새 값을 할당한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u64);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// 전송 계층 이벤트 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// 연결 수립
    Opened,
    /// 메시지 본문 (원문 텍스트)
    Message(String),
    /// 연결 실패
    Failed(String),
    /// 서버가 스트림을 닫음
    Closed,
}

/// 전송 계층 이벤트 — 어느 스트림에서 왔는지 함께 전달
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub stream_id: StreamId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(stream_id: StreamId, kind: TransportEventKind) -> Self {
        Self { stream_id, kind }
    }
}

/// 스트림 열기 요청
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// 새 핸들에 부여할 ID
    pub stream_id: StreamId,
    /// 정규화된 모니터링 대상 URL
    pub target_url: String,
    /// 수신 이벤트 전달 채널
    pub events: mpsc::Sender<TransportEvent>,
}

/// 열린 스트림 핸들
///
/// `close()`는 멱등이며 닫힌 핸들에 다시 호출해도 에러가 없다.
/// 구현체는 `Drop` 시에도 스트림을 닫아야 한다.
pub trait StreamHandle: Send {
    /// 핸들 ID
    fn stream_id(&self) -> StreamId;

    /// 스트림 닫기
    fn close(&mut self);

    /// 닫혔는지
    fn is_closed(&self) -> bool;
}

/// 텔레메트리 스트림 전송
pub trait StreamTransport: Send + Sync {
    /// 대상 URL에 대한 새 스트림 열기
    ///
    /// 즉시 반환하며, 이후 이벤트는 `request.events`로 전달된다.
    fn open(&self, request: StreamRequest) -> Result<Box<dyn StreamHandle>, CoreError>;
}
