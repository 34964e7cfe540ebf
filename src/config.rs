// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : reversal_screener — gapper spotlight & reversal leaderboard console
Module  : <module_name>.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Shows a ranked leaderboard of small-cap reversal candidates,
          keeps filter state (VWAP proximity, Fibonacci level, dilution
          risk), opens a deep-dive panel with agent commentary, exposes
          Prometheus metrics, and records JSONL events.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use clap::Parser;
use dotenvy::dotenv;
use std::env;
use tokio::time::Duration;

use crate::catalog::RankMode;
use crate::panel::DEFAULT_CLOSE_DELAY;

/// Override dari command line (menang atas ENV)
#[derive(Parser, Debug)]
#[command(name = "reversal_screener", version, about = "Reversal leaderboard console")]
pub struct Cli {
    /// JSON catalog (array of stock records); default = seed bawaan
    #[arg(long)]
    pub catalog: Option<String>,
    /// Command script; default = stdin
    #[arg(long)]
    pub script: Option<String>,
    /// JSONL event log
    #[arg(long)]
    pub record: Option<String>,
    /// display | score
    #[arg(long)]
    pub rank: Option<String>,
    /// Apply filters to the leaderboard instead of only logging them
    #[arg(long)]
    pub apply_filters: bool,
}

#[derive(Clone, Debug)]
pub struct Args {
    // data
    pub catalog_file: Option<String>,
    pub script_file: Option<String>,

    // files/metrics
    pub record_file: Option<String>,
    pub metrics_port: Option<u16>, // None = metrics server off

    // behaviour
    pub rank_mode: RankMode,
    pub apply_filters: bool,
    pub close_delay: Duration,
}

fn env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn rank_from(raw: Option<String>) -> RankMode {
    raw.as_deref()
        .and_then(RankMode::parse_one)
        .unwrap_or_default()
}

pub fn load() -> Args {
    // Pastikan .env dibaca (CATALOG_FILE, RECORD_FILE, dll)
    let _ = dotenv();
    from_env_and_cli(Cli::parse())
}

pub fn from_env_and_cli(cli: Cli) -> Args {
    // ===== Data =====
    let catalog_file = cli.catalog.or_else(|| env::var("CATALOG_FILE").ok());
    let script_file = cli.script.or_else(|| env::var("SCRIPT_FILE").ok());

    // ===== Files / metrics =====
    let record_file = cli.record.or_else(|| env::var("RECORD_FILE").ok());
    // METRICS_PORT=0 -> server metrics dimatikan
    let metrics_port = match env::var("METRICS_PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
        Some(0) => None,
        Some(p) => Some(p),
        None => Some(9898),
    };

    // ===== Behaviour =====
    //   RANK_MODE=display|score
    //   APPLY_FILTERS=true
    //   PANEL_CLOSE_DELAY_MS=300
    let rank_mode = rank_from(cli.rank.or_else(|| env::var("RANK_MODE").ok()));
    let apply_filters = cli.apply_filters || env_bool("APPLY_FILTERS").unwrap_or(false);
    let close_delay = env::var("PANEL_CLOSE_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_CLOSE_DELAY);

    Args {
        catalog_file,
        script_file,
        record_file,
        metrics_port,
        rank_mode,
        apply_filters,
        close_delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "reversal_screener",
            "--catalog",
            "demos/catalog.json",
            "--rank",
            "score",
            "--apply-filters",
        ]);
        let args = from_env_and_cli(cli);
        assert_eq!(args.catalog_file.as_deref(), Some("demos/catalog.json"));
        assert_eq!(args.rank_mode, RankMode::Score);
        assert!(args.apply_filters);
    }

    #[test]
    fn test_rank_fallback() {
        assert_eq!(rank_from(None), RankMode::Display);
        assert_eq!(rank_from(Some("nonsense".into())), RankMode::Display);
        assert_eq!(rank_from(Some("SCORE".into())), RankMode::Score);
    }
}
