// ===============================
// src/dashboard.rs (page container)
// ===============================
//
// Pemilik semua state: FilterStateMachine, katalog (read-only), PanelStateMachine.
// Event UI masuk lewat mpsc; satu-satunya timer adalah deferred clear panel.
// Snapshot terbaru dipublish ke watch channel setelah setiap event/timer.
//
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, LeaderboardRow, RankMode};
use crate::domain::{now_ns, DashboardSnapshot, DilutionFilter, Event, FibonacciLevel, FilterState, StockRecord};
use crate::filters::{FilterError, FilterStateMachine};
use crate::metrics::{
    FILTER_CHANGES, PANEL_CLEARS, PANEL_CLEARS_CANCELLED, PANEL_CLOSES, PANEL_OPEN, ROWS_VISIBLE,
    SELECTIONS, UI_REJECTED, VIEWS_DROPPED,
};
use crate::panel::{ClearToken, PanelStateMachine, SelectionState};
use crate::view;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SetProximity(f64),
    SetFibonacciLevel(FibonacciLevel),
    SetDilutionRisk(DilutionFilter),
    ClearFilters,
    SelectTicker(String),
    SelectRow(usize),
    ClosePanel,
    Render,
}

impl UiEvent {
    fn kind(&self) -> &'static str {
        match self {
            UiEvent::SetProximity(_) => "vwap",
            UiEvent::SetFibonacciLevel(_) => "fib",
            UiEvent::SetDilutionRisk(_) => "dilution",
            UiEvent::ClearFilters => "clear",
            UiEvent::SelectTicker(_) => "select",
            UiEvent::SelectRow(_) => "row",
            UiEvent::ClosePanel => "close",
            UiEvent::Render => "show",
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),
    #[error("no row #{0} on the leaderboard")]
    NoSuchRow(usize),
}

#[derive(Debug, Clone)]
pub struct DashboardCfg {
    pub rank_mode: RankMode,
    pub apply_filters: bool,
    pub close_delay: Duration,
}

impl Default for DashboardCfg {
    fn default() -> Self {
        Self {
            rank_mode: RankMode::Display,
            apply_filters: false,
            close_delay: crate::panel::DEFAULT_CLOSE_DELAY,
        }
    }
}

pub struct Dashboard {
    catalog: Arc<Catalog>,
    cfg: DashboardCfg,
    filters: FilterStateMachine,
    panel: PanelStateMachine,
    // highlight baris milik leaderboard sendiri, tidak ikut dihapus deferred clear
    last_clicked: Option<String>,
    rec_tx: Option<mpsc::Sender<Event>>,
    view_tx: Option<mpsc::Sender<String>>,
}

impl Dashboard {
    pub fn new(
        catalog: Arc<Catalog>,
        cfg: DashboardCfg,
        rec_tx: Option<mpsc::Sender<Event>>,
        view_tx: Option<mpsc::Sender<String>>,
    ) -> Self {
        // onFiltersChange: cuma dicatat (log + recorder + metrics)
        let filter_rec = rec_tx.clone();
        let filters = FilterStateMachine::new(Box::new(move |f: &FilterState| {
            info!(
                vwap_proximity = f.vwap_proximity,
                fibonacci_level = f.fibonacci_level.as_str(),
                dilution_score = f.dilution_score.as_str(),
                "filters updated"
            );
            if let Some(tx) = &filter_rec {
                let _ = tx.try_send(Event::Filters { ts_ns: now_ns(), filters: *f });
            }
        }));
        let panel = PanelStateMachine::new(cfg.close_delay);
        let dash = Self { catalog, cfg, filters, panel, last_clicked: None, rec_tx, view_tx };
        ROWS_VISIBLE.set(dash.rows().len() as i64);
        dash
    }

    pub fn filters(&self) -> FilterState {
        self.filters.state()
    }

    pub fn selection(&self) -> &SelectionState {
        self.panel.state()
    }

    pub fn pending_clear(&self) -> Option<ClearToken> {
        self.panel.pending_clear()
    }

    /// Baris yang tampil; filter hanya dipakai kalau apply_filters aktif
    pub fn rows(&self) -> Vec<LeaderboardRow> {
        if self.cfg.apply_filters {
            let f = self.filters.state();
            self.catalog.rows_where(self.cfg.rank_mode, |r| f.matches(r))
        } else {
            self.catalog.rows(self.cfg.rank_mode)
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let sel = self.panel.state();
        DashboardSnapshot {
            ts_ns: now_ns(),
            filters: self.filters.state(),
            selected: sel.selected_stock.as_ref().map(|s| s.ticker.clone()),
            panel_open: sel.panel_open,
            highlighted: self.last_clicked.clone(),
            visible: self.rows().iter().map(|r| r.record.ticker.clone()).collect(),
        }
    }

    pub async fn handle(&mut self, ev: UiEvent, now: Instant) -> Result<(), DashboardError> {
        let kind = ev.kind();
        let res = self.dispatch(ev, now).await;
        if res.is_err() {
            UI_REJECTED.with_label_values(&[kind]).inc();
        }
        res
    }

    async fn dispatch(&mut self, ev: UiEvent, now: Instant) -> Result<(), DashboardError> {
        match ev {
            UiEvent::SetProximity(v) => {
                self.filters.set_proximity(v)?;
                self.on_filters_changed("vwap");
            }
            UiEvent::SetFibonacciLevel(level) => {
                self.filters.set_fibonacci_level(level);
                self.on_filters_changed("fib");
            }
            UiEvent::SetDilutionRisk(risk) => {
                self.filters.set_dilution_risk(risk);
                self.on_filters_changed("dilution");
            }
            UiEvent::ClearFilters => {
                self.filters.clear();
                self.on_filters_changed("clear");
            }
            UiEvent::SelectTicker(t) => {
                let rec = self
                    .catalog
                    .get(&t)
                    .ok_or(DashboardError::UnknownTicker(t))?;
                self.select(rec).await;
            }
            UiEvent::SelectRow(n) => {
                let rec = self
                    .rows()
                    .into_iter()
                    .find(|r| r.rank == n)
                    .map(|r| r.record)
                    .ok_or(DashboardError::NoSuchRow(n))?;
                self.select(rec).await;
            }
            UiEvent::ClosePanel => self.close(now),
            UiEvent::Render => {
                let sel = self.selection();
                let mut text = view::render_leaderboard(
                    &self.rows(),
                    &self.filters.state(),
                    self.cfg.apply_filters,
                    self.last_clicked.as_deref(),
                );
                if let (Some(s), true) = (&sel.selected_stock, sel.panel_open) {
                    text.push_str(&view::render_panel(s));
                }
                self.emit_view(text).await;
            }
        }
        Ok(())
    }

    fn on_filters_changed(&self, field: &str) {
        FILTER_CHANGES.with_label_values(&[field]).inc();
        ROWS_VISIBLE.set(self.rows().len() as i64);
    }

    async fn select(&mut self, rec: Arc<StockRecord>) {
        let ticker = rec.ticker.clone();
        if self.panel.select(rec.clone()) {
            PANEL_CLEARS_CANCELLED.inc();
            debug!(%ticker, "pending clear superseded");
        }
        SELECTIONS.with_label_values(&[&ticker]).inc();
        PANEL_OPEN.set(1);
        info!(%ticker, score = rec.reversal_score, "panel opened");
        self.last_clicked = Some(ticker.clone());
        self.record(Event::Select { ts_ns: now_ns(), ticker });
        self.emit_view(view::render_panel(&rec)).await;
    }

    fn close(&mut self, now: Instant) {
        let ticker = self.panel.state().selected_stock.as_ref().map(|s| s.ticker.clone());
        match self.panel.close(now) {
            Some(_) => {
                PANEL_CLOSES.inc();
                PANEL_OPEN.set(0);
                info!(ticker = ?ticker, delay_ms = self.cfg.close_delay.as_millis() as u64, "panel closing");
                self.record(Event::PanelClosed { ts_ns: now_ns(), ticker });
            }
            None => debug!(phase = ?self.panel.phase(), "close ignored: panel not open"),
        }
    }

    /// Timer deferred clear habis
    pub fn on_clear_timer(&mut self, token: ClearToken) {
        if let Some(rec) = self.panel.fire_clear(token) {
            PANEL_CLEARS.inc();
            debug!(ticker = %rec.ticker, "selection cleared");
            self.record(Event::SelectionCleared { ts_ns: now_ns(), ticker: rec.ticker.clone() });
        }
    }

    fn record(&self, ev: Event) {
        if let Some(tx) = &self.rec_tx {
            let _ = tx.try_send(ev);
        }
    }

    // Output yang ditunggu user: backpressure (await), bukan try_send
    async fn emit_view(&mut self, text: String) {
        let Some(tx) = &self.view_tx else { return };
        if tx.send(text).await.is_err() {
            VIEWS_DROPPED.inc();
            warn!("view printer gone, further views discarded");
            self.view_tx = None;
        }
    }
}

/// Event loop page container
pub async fn run(
    mut dash: Dashboard,
    mut ui_rx: mpsc::Receiver<UiEvent>,
    snap_tx: watch::Sender<DashboardSnapshot>,
) {
    let _ = snap_tx.send(dash.snapshot());

    loop {
        let pending = dash.pending_clear();
        let deadline = pending.map(|t| t.deadline).unwrap_or_else(Instant::now);

        tokio::select! {
            maybe_ev = ui_rx.recv() => {
                match maybe_ev {
                    Some(ev) => {
                        if let Err(e) = dash.handle(ev, Instant::now()).await {
                            warn!(error = %e, "ui event rejected");
                        }
                    }
                    None => {
                        let f = dash.filters();
                        info!(
                            vwap_proximity = f.vwap_proximity,
                            fibonacci_level = f.fibonacci_level.as_str(),
                            dilution_score = f.dilution_score.as_str(),
                            highlighted = ?dash.last_clicked,
                            "dashboard: ui channel closed, stopped"
                        );
                        break;
                    }
                }
            }

            _ = sleep_until(deadline), if pending.is_some() => {
                if let Some(token) = pending {
                    dash.on_clear_timer(token);
                }
            }
        }

        let _ = snap_tx.send(dash.snapshot());
    }
}
