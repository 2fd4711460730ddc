//! PingPong 도메인 모델.
//!
//! 스트림으로 수신하는 프로브 결과와 대시보드 세션 상태를 정의한다.
//! 와이어 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod ping;
pub mod session;
