//! 표준 입력 명령 콘솔.
//!
//! `start <url>`, `stop`, `status`, `workers`, `help`, `quit`.

use pingpong_core::models::session::SessionStatus;
use pingpong_dashboard::runner::DashboardHandle;
use std::io::BufRead;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::terminal::{status_line, summary_lines, worker_lines};

/// 콘솔 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start(String),
    Stop,
    Status,
    Workers,
    Help,
    Quit,
}

/// 명령 파싱 에러
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("대상 URL이 필요합니다: start <url>")]
    MissingTarget,

    #[error("알 수 없는 명령: {0} (help 참고)")]
    Unknown(String),
}

/// 콘솔 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// quit 명령
    Quit,
    /// 입력 스트림 끝
    Eof,
    /// 외부 종료 신호
    Shutdown,
}

const HELP: &[&str] = &[
    "start <url>  대상 모니터링 시작 (이전 스트림은 닫힘)",
    "stop         현재 스트림 중지",
    "status       상태와 전체 요약",
    "workers      워커별 최근 결과",
    "quit         종료",
];

/// 한 줄 파싱. 빈 줄은 None
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "start" => {
            if rest.is_empty() {
                return Err(ParseError::MissingTarget);
            }
            ConsoleCommand::Start(rest.to_string())
        }
        "stop" => ConsoleCommand::Stop,
        "status" => ConsoleCommand::Status,
        "workers" => ConsoleCommand::Workers,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// stop 전에 보여줄 안내. 수신 중인 스트림이 없을 때만
fn stop_notice(status: SessionStatus) -> Option<String> {
    (!status.is_live()).then(|| format!("진행 중인 스트림 없음 (status={status})"))
}

/// 표준 입력을 전용 스레드에서 읽어 채널로 전달
///
/// 블로킹 읽기가 런타임 종료를 막지 않도록 분리한다.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("표준 입력 읽기 실패: {e}");
                    return;
                }
            }
        }
        debug!("표준 입력 종료");
    });
    rx
}

/// 표준 입력 명령 루프
pub async fn run(
    handle: DashboardHandle,
    mut shutdown_rx: watch::Receiver<bool>,
    log_tail: usize,
) -> ConsoleExit {
    let mut lines = spawn_stdin_reader();

    loop {
        let line = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return ConsoleExit::Shutdown;
                }
                continue;
            }
            line = lines.recv() => line,
        };

        let Some(line) = line else {
            return ConsoleExit::Eof;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let outcome = match command {
            ConsoleCommand::Start(target) => handle.start(&target).await,
            ConsoleCommand::Stop => match stop_notice(handle.snapshot().status) {
                Some(notice) => {
                    println!("{notice}");
                    Ok(())
                }
                None => handle.stop().await,
            },
            ConsoleCommand::Status => {
                let snapshot = handle.snapshot();
                println!("{}", status_line(&snapshot));
                summary_lines(&snapshot)
                    .iter()
                    .for_each(|l| println!("{l}"));
                if snapshot.dropped_messages > 0 {
                    println!("비정상 메시지: {}건", snapshot.dropped_messages);
                }
                Ok(())
            }
            ConsoleCommand::Workers => {
                worker_lines(&handle.snapshot(), log_tail)
                    .iter()
                    .for_each(|l| println!("{l}"));
                Ok(())
            }
            ConsoleCommand::Help => {
                HELP.iter().for_each(|l| println!("{l}"));
                Ok(())
            }
            ConsoleCommand::Quit => return ConsoleExit::Quit,
        };

        if let Err(e) = outcome {
            println!("명령 실패: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_keeps_target_verbatim() {
        assert_eq!(
            parse_command("start example.com/health?x=1"),
            Ok(Some(ConsoleCommand::Start("example.com/health?x=1".to_string())))
        );
        assert_eq!(
            parse_command("  START   https://example.com  "),
            Ok(Some(ConsoleCommand::Start("https://example.com".to_string())))
        );
    }

    #[test]
    fn parse_start_without_target() {
        assert_eq!(parse_command("start"), Err(ParseError::MissingTarget));
        assert_eq!(parse_command("start   "), Err(ParseError::MissingTarget));
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("stop"), Ok(Some(ConsoleCommand::Stop)));
        assert_eq!(parse_command("status"), Ok(Some(ConsoleCommand::Status)));
        assert_eq!(parse_command("workers"), Ok(Some(ConsoleCommand::Workers)));
        assert_eq!(parse_command("?"), Ok(Some(ConsoleCommand::Help)));
        assert_eq!(parse_command("exit"), Ok(Some(ConsoleCommand::Quit)));
    }

    #[test]
    fn stop_notice_only_when_not_streaming() {
        assert_eq!(stop_notice(SessionStatus::Connected), None);
        assert_eq!(
            stop_notice(SessionStatus::Completed).as_deref(),
            Some("진행 중인 스트림 없음 (status=completed)")
        );
        assert!(stop_notice(SessionStatus::Idle).is_some());
        assert!(stop_notice(SessionStatus::Error).is_some());
    }

    #[test]
    fn parse_blank_and_unknown() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(
            parse_command("restart"),
            Err(ParseError::Unknown("restart".to_string()))
        );
    }
}
