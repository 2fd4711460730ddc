//! # pingpong-dashboard
//!
//! 텔레메트리 스트림 집계 엔진.
//! 전송 계층 이벤트를 디코딩하여 세션 상태를 갱신하고,
//! 최신 순 결과 버퍼를 유지하며 워커별 분할과 집계 통계를 계산한다.
//!
//! ## 구조
//!
//! - [`decoder`] — 원문 메시지 → `StreamMessage`
//! - [`buffer`] — 용량 제한 결과 버퍼 (최신 순)
//! - [`partition`] — 워커별 분할 뷰
//! - [`aggregate`] — 성공률/지연 집계
//! - [`session`] — 세션 상태 머신 (핸들 소유)
//! - [`runner`] — 명령/이벤트를 직렬 처리하는 비동기 루프, 스냅샷 구독

pub mod aggregate;
pub mod buffer;
pub mod decoder;
pub mod partition;
pub mod runner;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
