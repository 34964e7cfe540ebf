// ===============================
// src/main.rs
// ===============================
/*
 cd /home/kukuhtw/rust/reversal_screener

 # sesi interaktif (ketik: show, select BNGO, close, vwap 7.5, fib 61.8, quit)
 cargo run

 # skrip demo + recorder + filter benar-benar diterapkan
 cargo run -- --script demos/session.txt --record data/events.jsonl --apply-filters

 # metrics
 curl -s localhost:9898/metrics | egrep '^(selections_total|panel_|filter_changes_total)'
*/
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
mod domain;
mod config;
mod metrics;
mod recorder;
mod catalog;
mod filters;
mod panel;
mod commentary;
mod view;
mod dashboard;
mod console;

use std::sync::Arc;
use tokio::{
    io::BufReader,
    sync::{mpsc, watch},
};
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::dashboard::{Dashboard, DashboardCfg, UiEvent};
use crate::domain::{DashboardSnapshot, Event};

#[tokio::main]
async fn main() {
    // ---- Logging (stderr; stdout untuk tampilan) ----
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ---- Load config ----
    let args = config::load();

    // ---- Metrics ----
    metrics::init();
    if let Some(port) = args.metrics_port {
        metrics::serve_metrics(port);
    }

    // ---- Catalog (diinject ke dashboard) ----
    let catalog = match &args.catalog_file {
        Some(path) => match Catalog::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!(%path, error = %e, "catalog load failed");
                std::process::exit(1);
            }
        },
        None => Catalog::seed(),
    };
    if catalog.is_empty() {
        warn!("catalog is empty, leaderboard will have no rows");
    }

    info!(
        catalog = args.catalog_file.as_deref().unwrap_or("seed"),
        records = catalog.len(),
        tickers = ?catalog.records().iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
        rank_mode = args.rank_mode.as_str(),
        apply_filters = args.apply_filters,
        close_delay_ms = args.close_delay.as_millis() as u64,
        script = args.script_file.as_deref().unwrap_or("stdin"),
        "startup config"
    );

    crate::metrics::CATALOG_RECORDS.set(catalog.len() as i64);
    crate::metrics::CONFIG_RANK_MODE
        .with_label_values(&[args.rank_mode.as_str()])
        .set(1);
    crate::metrics::CONFIG_APPLY_FILTERS.set(args.apply_filters as i64);

    // ---- Recorder (optional) ----
    let (rec_tx, rec_handle) = match args.record_file.clone() {
        Some(path) => {
            let (tx, rx) = mpsc::channel::<Event>(1024);
            (Some(tx), Some(tokio::spawn(recorder::run(rx, path))))
        }
        None => (None, None),
    };
    if let Some(tx) = &rec_tx {
        let _ = tx.try_send(Event::Note(format!("session start, {} records", catalog.len())));
    }

    // ---- Buses ----
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(256);
    // dashboard menunggu (send().await) kalau printer tertinggal, view tidak dibuang
    let (view_tx, view_rx) = mpsc::channel::<String>(64);
    let (snap_tx, snap_rx) = watch::channel::<DashboardSnapshot>(DashboardSnapshot::default());

    // ---- Page container ----
    let cfg = DashboardCfg {
        rank_mode: args.rank_mode,
        apply_filters: args.apply_filters,
        close_delay: args.close_delay,
    };
    let dash = Dashboard::new(Arc::new(catalog), cfg, rec_tx.clone(), Some(view_tx));
    let dash_handle = tokio::spawn(dashboard::run(dash, ui_rx, snap_tx));
    let printer = tokio::spawn(console::print_views(view_rx));

    // Tampilkan leaderboard awal
    let _ = ui_tx.send(UiEvent::Render).await;

    // ---- Console input (script file atau stdin) ----
    match &args.script_file {
        Some(path) => match tokio::fs::File::open(path).await {
            Ok(f) => console::run(BufReader::new(f), ui_tx).await,
            Err(e) => {
                error!(%path, ?e, "script open failed");
                drop(ui_tx);
            }
        },
        None => console::run(BufReader::new(tokio::io::stdin()), ui_tx).await,
    }

    // ---- Shutdown: dashboard -> printer -> recorder ----
    let _ = dash_handle.await;
    let _ = printer.await;

    let last = snap_rx.borrow().clone();
    info!(
        selected = ?last.selected,
        panel_open = last.panel_open,
        highlighted = ?last.highlighted,
        visible = last.visible.len(),
        "session finished"
    );

    if let Some(tx) = rec_tx {
        let _ = tx.try_send(Event::Note("session end".to_string()));
    }
    if let Some(h) = rec_handle {
        let _ = h.await;
    }
}
