//! 대시보드 실행 루프.
//!
//! 세션을 소유하고 제어 명령과 전송 이벤트를 한 번에 하나씩 처리한다.
//! 상태가 바뀔 때마다 스냅샷을 `watch` 채널과 등록된 프레젠터에 발행한다.

use pingpong_core::error::CoreError;
use pingpong_core::models::session::SessionSnapshot;
use pingpong_core::ports::presenter::SnapshotPresenter;
use pingpong_core::ports::transport::{StreamTransport, TransportEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::session::{normalize_target, DashboardSession};

/// 전송 이벤트 채널 크기
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 제어 명령 채널 크기
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// 제어 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 대상 URL로 스트림 시작
    Start(String),
    /// 현재 스트림 중지
    Stop,
    /// 세션 정리 후 루프 종료
    Shutdown,
}

/// 제어 표면 — 시작/중지 명령과 스냅샷 구독
#[derive(Clone)]
pub struct DashboardHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl DashboardHandle {
    /// 스트림 시작 요청
    ///
    /// 빈 대상은 명령을 보내기 전에 거부한다.
    pub async fn start(&self, target: &str) -> Result<(), CoreError> {
        if normalize_target(target).is_none() {
            return Err(CoreError::validation(
                "target_url",
                "모니터링 대상이 비어 있습니다",
            ));
        }
        self.send(SessionCommand::Start(target.to_string())).await
    }

    /// 스트림 중지 요청
    pub async fn stop(&self) -> Result<(), CoreError> {
        self.send(SessionCommand::Stop).await
    }

    /// 세션을 정리하고 루프를 종료
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.send(SessionCommand::Shutdown).await
    }

    /// 스냅샷 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// 최신 스냅샷 복제본
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), CoreError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::Internal("대시보드 루프가 종료되었습니다".to_string()))
    }
}

/// 대시보드 실행 루프
pub struct DashboardRunner {
    session: DashboardSession,
    events_rx: mpsc::Receiver<TransportEvent>,
    commands_rx: mpsc::Receiver<SessionCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    presenters: Vec<Arc<dyn SnapshotPresenter>>,
}

impl DashboardRunner {
    /// 새 실행 루프와 제어 핸들 생성
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        buffer_capacity: usize,
    ) -> (Self, DashboardHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let session = DashboardSession::new(transport, buffer_capacity, events_tx);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let runner = Self {
            session,
            events_rx,
            commands_rx,
            snapshot_tx,
            presenters: Vec::new(),
        };
        let handle = DashboardHandle {
            commands: commands_tx,
            snapshots: snapshot_rx,
        };
        (runner, handle)
    }

    /// 프레젠터 등록
    pub fn with_presenter(mut self, presenter: Arc<dyn SnapshotPresenter>) -> Self {
        self.presenters.push(presenter);
        self
    }

    /// 실행 루프 (종료 신호 또는 모든 제어 핸들이 drop될 때까지)
    ///
    /// 종료 시 세션을 정리하여 열린 스트림을 닫는다.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("대시보드 루프 시작");
        self.publish();

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("종료 신호 수신");
                        break;
                    }
                }

                command = self.commands_rx.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown) => {
                            info!("종료 명령 수신");
                            break;
                        }
                        Some(command) => self.apply(command),
                        None => {
                            debug!("제어 핸들이 모두 닫힘");
                            break;
                        }
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    if self.session.handle_event(event) {
                        self.publish();
                    }
                }
            }
        }

        self.session.dispose();
        info!("대시보드 루프 종료");
    }

    fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start(target) => {
                // 열기 실패도 상태(error)를 바꾸므로 항상 발행
                if let Err(e) = self.session.start(&target) {
                    warn!("시작 실패: {e}");
                }
                self.publish();
            }
            SessionCommand::Stop => {
                if self.session.stop() {
                    self.publish();
                }
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        for presenter in &self.presenters {
            presenter.render(&snapshot);
        }
        self.snapshot_tx.send_replace(snapshot);
    }
}
