// ===============================
// src/console.rs
// ===============================
//
// Adapter input/output untuk dashboard:
// - run          : baca perintah baris-per-baris (stdin atau file script) -> UiEvent
// - print_views  : tulis hasil render (leaderboard / panel) ke stdout
//
// Perintah (case-insensitive, '#' = komentar):
//   vwap <pct> | proximity <pct>     fib <all|61.8|78.6|both>
//   dilution <all|low|medium|high|very-high>    clear
//   select <TICKER> | row <n> | close | show | wait <ms> | quit
//
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt},
    sync::mpsc,
    time::{sleep, Duration},
};
use tracing::{info, warn};

use crate::dashboard::UiEvent;
use crate::filters::{parse_dilution, parse_fibonacci_level, FilterError};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ui(UiEvent),
    Wait(Duration),
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArg(&'static str),
    #[error("bad number for `{cmd}`: {arg}")]
    BadNumber { cmd: &'static str, arg: String },
    #[error(transparent)]
    Filter(#[from] FilterError),
}

fn number<T: std::str::FromStr>(cmd: &'static str, arg: Option<&str>) -> Result<T, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArg(cmd))?;
    arg.trim_end_matches('%')
        .parse()
        .map_err(|_| CommandError::BadNumber { cmd, arg: arg.to_string() })
}

/// Ok(None) untuk baris kosong / komentar
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next();

    let cmd = match head.as_str() {
        "vwap" | "proximity" => Command::Ui(UiEvent::SetProximity(number("vwap", arg)?)),
        "fib" | "fibonacci" => {
            let a = arg.ok_or(CommandError::MissingArg("fib"))?;
            Command::Ui(UiEvent::SetFibonacciLevel(parse_fibonacci_level(a)?))
        }
        "dilution" => {
            let a = arg.ok_or(CommandError::MissingArg("dilution"))?;
            Command::Ui(UiEvent::SetDilutionRisk(parse_dilution(a)?))
        }
        "clear" => Command::Ui(UiEvent::ClearFilters),
        "select" => {
            let t = arg.ok_or(CommandError::MissingArg("select"))?;
            Command::Ui(UiEvent::SelectTicker(t.to_ascii_uppercase()))
        }
        "row" => Command::Ui(UiEvent::SelectRow(number("row", arg)?)),
        "close" => Command::Ui(UiEvent::ClosePanel),
        "show" | "list" => Command::Ui(UiEvent::Render),
        "wait" => Command::Wait(Duration::from_millis(number("wait", arg)?)),
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

/// Baca perintah sampai EOF / quit. Channel ditutup saat fungsi selesai (ui_tx di-drop).
pub async fn run<R>(reader: R, ui_tx: mpsc::Sender<UiEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut n: u64 = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                warn!(?e, "console: read failed, stopping");
                break;
            }
        };
        n += 1;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Ui(ev))) => {
                if ui_tx.send(ev).await.is_err() {
                    warn!("console: dashboard gone");
                    break;
                }
            }
            Ok(Some(Command::Wait(d))) => sleep(d).await,
            Ok(Some(Command::Quit)) => break,
            Err(e) => warn!(line = n, error = %e, "console: bad command"),
        }
    }
    info!(lines = n, "console: input finished");
}

pub async fn print_views(mut rx: mpsc::Receiver<String>) {
    let mut out = tokio::io::stdout();
    while let Some(text) = rx.recv().await {
        if out.write_all(text.as_bytes()).await.is_err() {
            break;
        }
        let _ = out.write_all(b"\n").await;
        let _ = out.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DilutionFilter, FibonacciLevel};

    #[test]
    fn test_parse_filter_commands() {
        assert_eq!(parse_command("vwap 7.5").unwrap(), Some(Command::Ui(UiEvent::SetProximity(7.5))));
        assert_eq!(parse_command("PROXIMITY 3%").unwrap(), Some(Command::Ui(UiEvent::SetProximity(3.0))));
        assert_eq!(
            parse_command("fib both").unwrap(),
            Some(Command::Ui(UiEvent::SetFibonacciLevel(FibonacciLevel::Both)))
        );
        assert_eq!(
            parse_command("dilution very-high").unwrap(),
            Some(Command::Ui(UiEvent::SetDilutionRisk(DilutionFilter::VeryHigh)))
        );
        assert_eq!(parse_command("clear").unwrap(), Some(Command::Ui(UiEvent::ClearFilters)));
    }

    #[test]
    fn test_parse_selection_commands() {
        assert_eq!(
            parse_command("select bngo").unwrap(),
            Some(Command::Ui(UiEvent::SelectTicker("BNGO".into())))
        );
        assert_eq!(parse_command("row 3").unwrap(), Some(Command::Ui(UiEvent::SelectRow(3))));
        assert_eq!(parse_command("close").unwrap(), Some(Command::Ui(UiEvent::ClosePanel)));
        assert_eq!(parse_command("show").unwrap(), Some(Command::Ui(UiEvent::Render)));
        assert_eq!(parse_command("wait 300").unwrap(), Some(Command::Wait(Duration::from_millis(300))));
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_blank_and_comments() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   # just a note").unwrap(), None);
        assert_eq!(parse_command("close # trailing").unwrap(), Some(Command::Ui(UiEvent::ClosePanel)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("buy AMC"), Err(CommandError::Unknown("buy".into())));
        assert_eq!(parse_command("select"), Err(CommandError::MissingArg("select")));
        assert_eq!(
            parse_command("row two"),
            Err(CommandError::BadNumber { cmd: "row", arg: "two".into() })
        );
        assert!(matches!(parse_command("fib 50"), Err(CommandError::Filter(FilterError::UnknownFibLevel(_)))));
    }

    #[tokio::test]
    async fn test_run_forwards_events_until_quit() {
        let script = "vwap 10\n# comment\nbogus\nselect amc\nquit\nclose\n";
        let (tx, mut rx) = mpsc::channel(8);
        run(script.as_bytes(), tx).await;

        assert_eq!(rx.recv().await, Some(UiEvent::SetProximity(10.0)));
        assert_eq!(rx.recv().await, Some(UiEvent::SelectTicker("AMC".into())));
        assert_eq!(rx.recv().await, None);
    }
}
