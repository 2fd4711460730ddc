//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 어댑터 crate가 이 trait들을 구현하며,
//! `pingpong-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 엔진은 블로킹하지 않으므로 포트는 동기 trait이다.
//! 비동기 수신은 어댑터 내부 태스크가 mpsc 채널로 전달한다.

pub mod presenter;
pub mod transport;
