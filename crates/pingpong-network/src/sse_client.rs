//! SSE(Server-Sent Events) 텔레메트리 스트림 클라이언트.
//!
//! `StreamTransport` 포트 구현. 스트림마다 수신 태스크 하나를 띄우고,
//! 핸들을 닫거나 drop하면 태스크를 중단한다. 자동 재연결은 하지 않는다.

use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use pingpong_core::config::ServerConfig;
use pingpong_core::error::CoreError;
use pingpong_core::ports::transport::{
    StreamHandle, StreamId, StreamRequest, StreamTransport, TransportEvent, TransportEventKind,
};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// 기본 메시지 이벤트 타입
const MESSAGE_EVENT: &str = "message";

/// 대상 URL 쿼리 파라미터 이름
const TARGET_PARAM: &str = "target";

/// SSE 스트림 전송 — `StreamTransport` 포트 구현
pub struct SseStreamTransport {
    base_url: String,
    stream_path: String,
    http_client: reqwest::Client,
}

impl SseStreamTransport {
    /// 새 SSE 전송 생성
    pub fn new(
        base_url: &str,
        stream_path: &str,
        connect_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 API URL: {base_url}: {e}")))?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        Ok(Self {
            base_url,
            stream_path: stream_path.to_string(),
            http_client,
        })
    }

    /// 서버 설정으로 생성
    pub fn from_config(config: &ServerConfig) -> Result<Self, CoreError> {
        Self::new(
            &config.base_url,
            &config.stream_path,
            config.connect_timeout(),
        )
    }

    /// 대상 URL을 `target` 쿼리 파라미터로 붙인 스트림 주소
    pub fn stream_url(&self, target_url: &str) -> Result<Url, CoreError> {
        let raw = format!("{}{}", self.base_url, self.stream_path);
        let mut url = Url::parse(&raw)
            .map_err(|e| CoreError::Config(format!("잘못된 스트림 URL: {raw}: {e}")))?;
        url.query_pairs_mut().append_pair(TARGET_PARAM, target_url);
        Ok(url)
    }

    /// 스트림 수신 루프
    ///
    /// 이벤트 채널이 닫히면 조용히 종료한다.
    async fn pump(
        http_client: reqwest::Client,
        url: Url,
        stream_id: StreamId,
        events: mpsc::Sender<TransportEvent>,
    ) {
        let emit = |kind| events.send(TransportEvent::new(stream_id, kind));

        let response = match http_client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("SSE 연결 실패: {e}");
                let _ = emit(TransportEventKind::Failed(e.to_string())).await;
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("SSE 연결 거부: HTTP {status}");
            let _ = emit(TransportEventKind::Failed(format!("HTTP {status}"))).await;
            return;
        }

        debug!("SSE 연결 수립됨: {stream_id}");
        if emit(TransportEventKind::Opened).await.is_err() {
            return;
        }

        let mut stream = response.bytes_stream().eventsource();
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if !event.event.is_empty() && event.event != MESSAGE_EVENT {
                        debug!("무시하는 SSE 이벤트 타입: {}", event.event);
                        continue;
                    }
                    if emit(TransportEventKind::Message(event.data)).await.is_err() {
                        debug!("이벤트 채널 닫힘, 수신 종료");
                        return;
                    }
                }
                Err(e) => {
                    warn!("SSE 스트림 에러: {e}");
                    let _ = emit(TransportEventKind::Failed(e.to_string())).await;
                    return;
                }
            }
        }

        info!("SSE 스트림 종료: {stream_id}");
        let _ = emit(TransportEventKind::Closed).await;
    }
}

impl StreamTransport for SseStreamTransport {
    fn open(&self, request: StreamRequest) -> Result<Box<dyn StreamHandle>, CoreError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("tokio 런타임 없음: {e}")))?;
        let url = self.stream_url(&request.target_url)?;

        info!("SSE 연결 시작: {url}");
        let task = runtime.spawn(Self::pump(
            self.http_client.clone(),
            url,
            request.stream_id,
            request.events,
        ));

        Ok(Box::new(SseStreamHandle {
            stream_id: request.stream_id,
            task: Some(task),
        }))
    }
}

/// SSE 스트림 핸들 — 닫거나 drop하면 수신 태스크 중단
pub struct SseStreamHandle {
    stream_id: StreamId,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle for SseStreamHandle {
    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("SSE 수신 태스크 중단: {}", self.stream_id);
        }
    }

    fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for SseStreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}
