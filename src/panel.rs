// ===============================
// src/panel.rs (selection + deep-dive panel)
// ===============================
//
// State: Closed -> Open (select) -> Closing (close) -> Closed (setelah delay).
// Clear yang tertunda dipegang sebagai ClearToken; setiap select() menaikkan
// generation sehingga token lama tidak bisa lagi mengosongkan panel.
//
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::domain::StockRecord;

pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Closed,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearToken {
    generation: u64,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_stock: Option<Arc<StockRecord>>,
    pub panel_open: bool,
}

#[derive(Debug)]
pub struct PanelStateMachine {
    state: SelectionState,
    generation: u64,
    pending: Option<ClearToken>,
    close_delay: Duration,
}

impl PanelStateMachine {
    pub fn new(close_delay: Duration) -> Self {
        Self {
            state: SelectionState::default(),
            generation: 0,
            pending: None,
            close_delay,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn phase(&self) -> PanelPhase {
        match (&self.state.selected_stock, self.state.panel_open) {
            (Some(_), true) => PanelPhase::Open,
            (Some(_), false) => PanelPhase::Closing,
            _ => PanelPhase::Closed,
        }
    }

    pub fn pending_clear(&self) -> Option<ClearToken> {
        self.pending
    }

    /// Select dari state mana pun; membatalkan clear yang masih pending.
    /// Return true kalau ada clear yang dibatalkan.
    pub fn select(&mut self, record: Arc<StockRecord>) -> bool {
        self.generation += 1;
        let cancelled = self.pending.take().is_some();
        self.state = SelectionState { selected_stock: Some(record), panel_open: true };
        cancelled
    }

    /// Tutup panel sekarang, jadwalkan clear selectedStock setelah delay.
    /// Idempotent: di Closing/Closed tidak melakukan apa pun.
    pub fn close(&mut self, now: Instant) -> Option<ClearToken> {
        if !self.state.panel_open {
            return None;
        }
        self.state.panel_open = false;
        self.state.selected_stock.as_ref()?;

        self.generation += 1;
        let token = ClearToken { generation: self.generation, deadline: now + self.close_delay };
        self.pending = Some(token);
        Some(token)
    }

    /// Dipanggil saat timer habis. Token basi (sudah di-supersede) diabaikan.
    pub fn fire_clear(&mut self, token: ClearToken) -> Option<Arc<StockRecord>> {
        if self.pending != Some(token) {
            return None;
        }
        self.pending = None;
        self.state.selected_stock.take()
    }
}

impl Default for PanelStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn stock(t: &str) -> Arc<StockRecord> {
        Catalog::seed().get(t).unwrap()
    }

    #[test]
    fn test_initial_state_closed() {
        let p = PanelStateMachine::default();
        assert_eq!(p.phase(), PanelPhase::Closed);
        assert_eq!(*p.state(), SelectionState::default());
        assert!(p.pending_clear().is_none());
    }

    #[test]
    fn test_select_opens_and_last_select_wins() {
        let mut p = PanelStateMachine::default();
        p.select(stock("BNGO"));
        assert_eq!(p.phase(), PanelPhase::Open);

        p.select(stock("AMC"));
        let s = p.state();
        assert!(s.panel_open);
        assert_eq!(s.selected_stock.as_ref().unwrap().ticker, "AMC");
    }

    #[test]
    fn test_close_then_clear_after_delay() {
        let mut p = PanelStateMachine::default();
        let t0 = Instant::now();
        p.select(stock("BNGO"));

        let token = p.close(t0).unwrap();
        assert_eq!(token.deadline - t0, Duration::from_millis(300));
        assert_eq!(p.phase(), PanelPhase::Closing);
        assert!(!p.state().panel_open);
        assert_eq!(p.state().selected_stock.as_ref().unwrap().ticker, "BNGO");

        let cleared = p.fire_clear(token).unwrap();
        assert_eq!(cleared.ticker, "BNGO");
        assert_eq!(p.phase(), PanelPhase::Closed);
        assert!(p.pending_clear().is_none());
    }

    #[test]
    fn test_select_during_closing_cancels_stale_clear() {
        let mut p = PanelStateMachine::default();
        p.select(stock("BNGO"));
        let stale = p.close(Instant::now()).unwrap();

        assert!(p.select(stock("TLRY")));
        assert!(p.fire_clear(stale).is_none());
        assert_eq!(p.phase(), PanelPhase::Open);
        assert_eq!(p.state().selected_stock.as_ref().unwrap().ticker, "TLRY");
    }

    #[test]
    fn test_stale_token_from_earlier_cycle_is_ignored() {
        let mut p = PanelStateMachine::default();
        let now = Instant::now();
        p.select(stock("BNGO"));
        let first = p.close(now).unwrap();
        p.select(stock("RIOT"));
        let second = p.close(now).unwrap();
        assert_ne!(first, second);

        assert!(p.fire_clear(first).is_none());
        assert_eq!(p.phase(), PanelPhase::Closing);
        assert_eq!(p.fire_clear(second).unwrap().ticker, "RIOT");
    }

    #[test]
    fn test_double_close_is_noop() {
        let mut p = PanelStateMachine::default();
        let now = Instant::now();
        assert!(p.close(now).is_none());

        p.select(stock("SNDL"));
        let token = p.close(now).unwrap();
        assert!(p.close(now + Duration::from_millis(100)).is_none());
        assert_eq!(p.pending_clear(), Some(token));
    }

    #[test]
    fn test_custom_delay() {
        let mut p = PanelStateMachine::new(Duration::from_millis(50));
        let now = Instant::now();
        p.select(stock("AMC"));
        let token = p.close(now).unwrap();
        assert_eq!(token.deadline, now + Duration::from_millis(50));
    }
}
