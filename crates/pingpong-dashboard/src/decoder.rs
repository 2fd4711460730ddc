//! 스트림 메시지 디코더.
//!
//! 원문 텍스트 하나를 `PingResult` 또는 종료 신호로 변환한다. 부수 효과 없음.
//! 디코딩 실패는 치명적이지 않으며 세션은 해당 메시지만 버린다.

use pingpong_core::models::ping::{PingResult, StatusUpdate, StreamMessage};
use serde_json::Value;
use thiserror::Error;

/// 디코딩 실패 (프로토콜 이상)
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON이 아님
    #[error("JSON 파싱 실패: {0}")]
    Malformed(#[source] serde_json::Error),

    /// JSON 객체가 아님
    #[error("JSON 객체가 아님")]
    NotAnObject,

    /// status 필드 형식 오류
    #[error("status 형식 오류: {0}")]
    InvalidStatus(#[source] serde_json::Error),

    /// 종료 신호가 아닌 status 값
    #[error("알 수 없는 status 값: {0}")]
    UnrecognizedStatus(String),

    /// PingResult 형식 불일치
    #[error("PingResult 형식 불일치: {0}")]
    InvalidResult(#[source] serde_json::Error),

    /// 성공 결과에 metrics 누락
    #[error("성공 결과에 metrics 누락 (worker={worker_id})")]
    MissingMetrics { worker_id: String },

    /// 음수 또는 유한하지 않은 측정값
    #[error("잘못된 측정값 (worker={worker_id})")]
    InvalidMetric { worker_id: String },
}

/// 메시지 하나를 디코딩
///
/// `workerId` 없이 `status`만 가진 객체는 제어 신호로 본다.
/// 그 외 객체는 `PingResult`로 해석한다.
pub fn decode(payload: &str) -> Result<StreamMessage, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::Malformed)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    if object.contains_key("status") && !object.contains_key("workerId") {
        let update: StatusUpdate =
            serde_json::from_value(value).map_err(DecodeError::InvalidStatus)?;
        return if update.is_completed() {
            Ok(StreamMessage::Completed)
        } else {
            Err(DecodeError::UnrecognizedStatus(update.status))
        };
    }

    let result: PingResult = serde_json::from_value(value).map_err(DecodeError::InvalidResult)?;

    if result.success {
        match result.metrics {
            None => {
                return Err(DecodeError::MissingMetrics {
                    worker_id: result.worker_id,
                })
            }
            Some(metrics) if !metrics.is_valid() => {
                return Err(DecodeError::InvalidMetric {
                    worker_id: result.worker_id,
                })
            }
            Some(_) => {}
        }
    }

    Ok(StreamMessage::Result(result))
}
