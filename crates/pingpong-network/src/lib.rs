//! # pingpong-network
//!
//! 텔레메트리 스트림 네트워크 어댑터.
//! `GET {base}{stream_path}?target=<url>` SSE 스트림을 열고
//! 수신한 메시지를 `TransportEvent`로 세션에 전달한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use pingpong_network::sse_client::SseStreamTransport;
//!
//! let transport = SseStreamTransport::from_config(&config.server)?;
//! ```

pub mod sse_client;
