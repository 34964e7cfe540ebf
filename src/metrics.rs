// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    core::Collector, Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Filter / selection activity --------
pub static FILTER_CHANGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("filter_changes_total", "filter updates reported to the page (label: field)"),
        &["field"],
    )
    .unwrap()
});

pub static SELECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("selections_total", "leaderboard rows selected (label: ticker)"),
        &["ticker"],
    )
    .unwrap()
});

pub static PANEL_CLOSES: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("panel_closes_total", "deep-dive panel closes").unwrap());

pub static PANEL_CLEARS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("panel_clears_total", "deferred selection clears that fired").unwrap()
});

pub static PANEL_CLEARS_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "panel_clears_cancelled_total",
        "pending clears superseded by a new selection",
    )
    .unwrap()
});

pub static PANEL_OPEN: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("panel_open", "1 if the deep-dive panel is open").unwrap());

pub static UI_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ui_events_rejected_total", "ui events rejected (label: kind)"),
        &["kind"],
    )
    .unwrap()
});

pub static VIEWS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("views_dropped_total", "rendered views discarded because the printer is gone")
        .unwrap()
});

// -------- Catalog --------
pub static CATALOG_RECORDS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("catalog_records", "records in the catalog").unwrap());

pub static ROWS_VISIBLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("leaderboard_rows_visible", "rows currently on the leaderboard").unwrap()
});

// ---- Config visibility ----
pub static CONFIG_RANK_MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("config_rank_mode", "rank mode (label: mode)"),
        &["mode"],
    )
    .unwrap()
});

pub static CONFIG_APPLY_FILTERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("config_apply_filters", "1 if filters are applied to the catalog").unwrap()
});

fn collectors() -> Vec<(&'static str, Box<dyn Collector>)> {
    vec![
        ("filter_changes_total", Box::new(FILTER_CHANGES.clone())),
        ("selections_total", Box::new(SELECTIONS.clone())),
        ("panel_closes_total", Box::new(PANEL_CLOSES.clone())),
        ("panel_clears_total", Box::new(PANEL_CLEARS.clone())),
        ("panel_clears_cancelled_total", Box::new(PANEL_CLEARS_CANCELLED.clone())),
        ("panel_open", Box::new(PANEL_OPEN.clone())),
        ("ui_events_rejected_total", Box::new(UI_REJECTED.clone())),
        ("views_dropped_total", Box::new(VIEWS_DROPPED.clone())),
        ("catalog_records", Box::new(CATALOG_RECORDS.clone())),
        ("leaderboard_rows_visible", Box::new(ROWS_VISIBLE.clone())),
        ("config_rank_mode", Box::new(CONFIG_RANK_MODE.clone())),
        ("config_apply_filters", Box::new(CONFIG_APPLY_FILTERS.clone())),
    ]
}

/// Daftarkan semua metric ke REGISTRY. Aman dipanggil ulang (AlreadyReg diabaikan).
pub fn init() {
    for (name, c) in collectors() {
        match REGISTRY.register(c) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => tracing::warn!(metric = name, error = %e, "metric registration failed"),
        }
    }
}

pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// Status + body untuk request line "GET <path> HTTP/1.1"; selain / dan /metrics -> 404
fn route(request_line: &str) -> (&'static str, String) {
    let mut parts = request_line.split_whitespace();
    let (method, path) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
    let path = path.split('?').next().unwrap_or("");
    match (method, path) {
        ("GET", "/") | ("GET", "/metrics") => match encode_metrics() {
            Ok(body) if !body.is_empty() => ("200 OK", body),
            Ok(_) => ("200 OK", "# no metrics\n".to_string()),
            Err(e) => ("500 Internal Server Error", format!("encode error: {e}\n")),
        },
        ("GET", _) => ("404 Not Found", "not found\n".to_string()),
        _ => ("405 Method Not Allowed", "method not allowed\n".to_string()),
    }
}

fn handle_client(stream: TcpStream) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let (status, body) = route(&request_line);
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}

// Metrics server di OS thread sendiri (runtime tokio tetap bersih)
pub fn serve_metrics(port: u16) {
    thread::spawn(move || {
        let addr = format!("0.0.0.0:{port}");
        let listener = match TcpListener::bind(&addr) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(%addr, ?e, "metrics bind failed, metrics disabled");
                return;
            }
        };
        tracing::info!("metrics listening on http://{addr}/metrics");

        for conn in listener.incoming() {
            let res = conn.and_then(handle_client);
            if let Err(e) = res {
                tracing::warn!(?e, "metrics request failed");
            }
        }
    });
}
