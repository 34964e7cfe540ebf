// ===============================
// src/view.rs
// ===============================
//
// Render teks untuk leaderboard & panel deep-dive (output ke stdout via console).
//
use std::fmt::Write;

use crate::catalog::LeaderboardRow;
use crate::commentary::{insights, round1};
use crate::domain::{FilterState, StockRecord};

pub fn format_volume(volume: u64) -> String {
    if volume >= 1_000_000 {
        format!("{:.1}M", volume as f64 / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.0}K", volume as f64 / 1_000.0)
    } else {
        volume.to_string()
    }
}

fn signed(v: f64) -> String {
    if v >= 0.0 {
        format!("+{:.2}", v)
    } else {
        format!("{:.2}", v)
    }
}

pub fn format_change(r: &StockRecord) -> String {
    format!("{} ({}%)", signed(r.price_change), signed(r.price_change_percent))
}

pub fn render_filters(f: &FilterState, applied: bool) -> String {
    format!(
        "filters: vwap<={}% fib={} dilution={}{}",
        f.vwap_proximity,
        f.fibonacci_level.as_str(),
        f.dilution_score.as_str(),
        if applied { "" } else { " (not applied)" }
    )
}

/// `highlighted` = ticker terakhir yang diklik; tetap ditandai walau panel sudah ditutup
pub fn render_leaderboard(rows: &[LeaderboardRow], filters: &FilterState, applied: bool, highlighted: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Reversal Leaderboard ({} rows) ==", rows.len());
    let _ = writeln!(out, "{}", render_filters(filters, applied));
    let _ = writeln!(
        out,
        "  {:>3}  {:<6} {:>5} {:<9} {:<16} {:>8} {:>18} {:>8} {:>8} {:<10}",
        "#", "TICKER", "SCORE", "TIER", "SIGNAL", "PRICE", "CHANGE", "VOLUME", "VOL/AVG", "DILUTION"
    );
    for row in rows {
        let r = &row.record;
        let marker = if highlighted == Some(r.ticker.as_str()) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:>3}  {:<6} {:>5} {:<9} {:<16} {:>8} {:>18} {:>8} {:>7}%{} {:<10}",
            marker,
            format!("#{}", row.rank),
            r.ticker,
            r.reversal_score,
            row.tier.as_str(),
            r.key_signal,
            format!("${:.2}", r.price),
            format_change(r),
            format_volume(r.volume),
            row.volume_ratio_pct,
            if row.volume_hot { '!' } else { ' ' },
            r.dilution_risk,
        );
        let _ = writeln!(
            out,
            "        RSI {:.1} | VWAP +{}%   Fib: {}%   Avg: {}",
            round1(r.rsi),
            r.vwap_distance,
            r.fib_level,
            format_volume(r.avg_volume),
        );
    }
    out
}

pub fn render_panel(r: &StockRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} :: Deep Dive Analysis ==", r.ticker);
    let _ = writeln!(
        out,
        "price ${:.2} {} {}  | reversal score {}",
        r.price,
        if r.is_up() { "up" } else { "down" },
        format_change(r),
        r.reversal_score
    );
    let _ = writeln!(
        out,
        "VWAP distance +{}%  RSI {:.1}  Fibonacci {}%  Vol ratio {:.1}x",
        r.vwap_distance,
        round1(r.rsi),
        r.fib_level,
        round1(r.volume_ratio())
    );
    let _ = writeln!(out, "dilution risk: {}", r.dilution_risk);
    let _ = writeln!(out, "-- AI Agent Analysis --");
    for i in insights(r).iter() {
        let _ = writeln!(out, "[{}] {} ({}) {}% confidence", &i.agent[..1], i.agent, i.role, i.confidence);
        let _ = writeln!(out, "    {}", i.insight);
    }
    let _ = writeln!(
        out,
        "note: AI analysis for educational purposes. Always conduct your own research before trading."
    );
    out
}
