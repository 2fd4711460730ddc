//! 스냅샷 프레젠터 포트.
//!
//! 구현: `pingpong-app` crate (터미널 대시보드)

use crate::models::session::SessionSnapshot;

/// 세션 스냅샷을 렌더링하는 프레젠테이션 어댑터
///
/// 스냅샷은 읽기 전용이다. 렌더링은 엔진 루프를 막지 않아야 한다.
pub trait SnapshotPresenter: Send + Sync {
    /// 새 스냅샷 렌더링
    fn render(&self, snapshot: &SessionSnapshot);
}
