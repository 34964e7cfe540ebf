// ===============================
// src/filters.rs
// ===============================
use thiserror::Error;

use crate::domain::{DilutionFilter, FibonacciLevel, FilterState, StockRecord};

pub const PROXIMITY_MIN: f64 = 0.0;
pub const PROXIMITY_MAX: f64 = 20.0;
pub const PROXIMITY_STEP: f64 = 0.5;

const FIB_EPS: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("VWAP proximity {0} out of range 0..=20")]
    ProximityRange(f64),
    #[error("VWAP proximity {0} is not on the 0.5 step")]
    ProximityStep(f64),
    #[error("unknown fibonacci level: {0}")]
    UnknownFibLevel(String),
    #[error("unknown dilution risk: {0}")]
    UnknownDilution(String),
}

pub fn validate_proximity(value: f64) -> Result<f64, FilterError> {
    if !value.is_finite() || !(PROXIMITY_MIN..=PROXIMITY_MAX).contains(&value) {
        return Err(FilterError::ProximityRange(value));
    }
    if (value / PROXIMITY_STEP).fract() != 0.0 {
        return Err(FilterError::ProximityStep(value));
    }
    Ok(value)
}

pub fn parse_fibonacci_level(s: &str) -> Result<FibonacciLevel, FilterError> {
    FibonacciLevel::parse_one(s).ok_or_else(|| FilterError::UnknownFibLevel(s.trim().to_string()))
}

pub fn parse_dilution(s: &str) -> Result<DilutionFilter, FilterError> {
    DilutionFilter::parse_one(s).ok_or_else(|| FilterError::UnknownDilution(s.trim().to_string()))
}

impl FilterState {
    pub fn with_proximity(self, vwap_proximity: f64) -> Self {
        Self { vwap_proximity, ..self }
    }

    pub fn with_fibonacci_level(self, fibonacci_level: FibonacciLevel) -> Self {
        Self { fibonacci_level, ..self }
    }

    pub fn with_dilution_score(self, dilution_score: DilutionFilter) -> Self {
        Self { dilution_score, ..self }
    }

    /// Predikat filter (hanya dipakai kalau APPLY_FILTERS aktif)
    pub fn matches(&self, r: &StockRecord) -> bool {
        if r.vwap_distance > self.vwap_proximity {
            return false;
        }
        let is_618 = (r.fib_level - 61.8).abs() < FIB_EPS;
        let is_786 = (r.fib_level - 78.6).abs() < FIB_EPS;
        let fib_ok = match self.fibonacci_level {
            FibonacciLevel::All => true,
            FibonacciLevel::Fib618 => is_618,
            FibonacciLevel::Fib786 => is_786,
            FibonacciLevel::Both => is_618 || is_786,
        };
        if !fib_ok {
            return false;
        }
        match self.dilution_score.risk() {
            None => true,
            Some(risk) => r.dilution_risk == risk,
        }
    }
}

/// Callback owner: dipanggil dengan tuple filter lengkap setelah tiap perubahan
pub type FiltersCallback = Box<dyn FnMut(&FilterState) + Send>;

pub struct FilterStateMachine {
    state: FilterState,
    on_change: FiltersCallback,
}

impl FilterStateMachine {
    pub fn new(on_change: FiltersCallback) -> Self {
        Self { state: FilterState::default(), on_change }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn set_proximity(&mut self, value: f64) -> Result<FilterState, FilterError> {
        let value = validate_proximity(value)?;
        Ok(self.apply(self.state.with_proximity(value)))
    }

    pub fn set_fibonacci_level(&mut self, level: FibonacciLevel) -> FilterState {
        self.apply(self.state.with_fibonacci_level(level))
    }

    pub fn set_dilution_risk(&mut self, risk: DilutionFilter) -> FilterState {
        self.apply(self.state.with_dilution_score(risk))
    }

    /// Reset ke {5, all, all}; notify sekali
    pub fn clear(&mut self) -> FilterState {
        self.apply(FilterState::default())
    }

    fn apply(&mut self, next: FilterState) -> FilterState {
        self.state = next;
        (self.on_change)(&self.state);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::sync::{Arc, Mutex};

    fn recording_machine() -> (FilterStateMachine, Arc<Mutex<Vec<FilterState>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let fsm = FilterStateMachine::new(Box::new(move |f: &FilterState| {
            sink.lock().unwrap().push(*f);
        }));
        (fsm, seen)
    }

    #[test]
    fn test_defaults() {
        let (fsm, seen) = recording_machine();
        let s = fsm.state();
        assert_eq!(s.vwap_proximity, 5.0);
        assert_eq!(s.fibonacci_level, FibonacciLevel::All);
        assert_eq!(s.dilution_score, DilutionFilter::All);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_setters_replace_one_field_and_notify_full_tuple() {
        let (mut fsm, seen) = recording_machine();

        fsm.set_proximity(7.5).unwrap();
        fsm.set_fibonacci_level(FibonacciLevel::Fib618);
        fsm.set_dilution_risk(DilutionFilter::VeryHigh);
        fsm.set_proximity(2.0).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], FilterState { vwap_proximity: 7.5, ..FilterState::default() });
        assert_eq!(seen[1].vwap_proximity, 7.5);
        assert_eq!(seen[1].fibonacci_level, FibonacciLevel::Fib618);
        assert_eq!(seen[2].dilution_score, DilutionFilter::VeryHigh);
        assert_eq!(seen[2].fibonacci_level, FibonacciLevel::Fib618);
        assert_eq!(
            seen[3],
            FilterState {
                vwap_proximity: 2.0,
                fibonacci_level: FibonacciLevel::Fib618,
                dilution_score: DilutionFilter::VeryHigh,
            }
        );
        assert_eq!(fsm.state(), seen[3]);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Prox(f64),
        Fib(FibonacciLevel),
        Dil(DilutionFilter),
        Clear,
    }

    // Urutan setter berbeda-beda; tiap field harus = nilai terakhir yang di-set untuk field itu
    #[test]
    fn test_field_independence_across_setter_orders() {
        use Op::*;
        let prox = [Prox(0.0), Prox(12.5), Prox(20.0)];
        let fib = [Fib(FibonacciLevel::Fib786), Fib(FibonacciLevel::Both), Fib(FibonacciLevel::All)];
        let dil = [Dil(DilutionFilter::Low), Dil(DilutionFilter::VeryHigh), Dil(DilutionFilter::Medium)];

        let mut sequences: Vec<Vec<Op>> = Vec::new();
        // semua 6 permutasi dari tiga setter
        for order in [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let groups = [&prox, &fib, &dil];
            let mut seq = Vec::new();
            for round in 0..3 {
                for g in order {
                    seq.push(groups[g][round]);
                }
            }
            sequences.push(seq);
        }
        // acak deterministik (LCG) termasuk Clear di tengah
        let pool: Vec<Op> = prox.iter().chain(&fib).chain(&dil).copied().chain([Clear]).collect();
        let mut x: u64 = 0x5eed;
        for _ in 0..20 {
            let seq = (0..15)
                .map(|_| {
                    x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    pool[(x >> 33) as usize % pool.len()]
                })
                .collect();
            sequences.push(seq);
        }

        for seq in &sequences {
            let (mut fsm, seen) = recording_machine();
            let mut expected = FilterState::default();
            for (i, op) in seq.iter().enumerate() {
                match *op {
                    Prox(v) => {
                        fsm.set_proximity(v).unwrap();
                        expected.vwap_proximity = v;
                    }
                    Fib(l) => {
                        fsm.set_fibonacci_level(l);
                        expected.fibonacci_level = l;
                    }
                    Dil(d) => {
                        fsm.set_dilution_risk(d);
                        expected.dilution_score = d;
                    }
                    Clear => {
                        fsm.clear();
                        expected = FilterState::default();
                    }
                }
                assert_eq!(fsm.state(), expected, "after {:?} in {:?}", op, seq);
                let seen = seen.lock().unwrap();
                assert_eq!(seen.len(), i + 1);
                assert_eq!(seen[i], expected);
            }
        }
    }

    #[test]
    fn test_clear_resets_and_notifies_once() {
        let (mut fsm, seen) = recording_machine();
        fsm.set_proximity(20.0).unwrap();
        fsm.set_fibonacci_level(FibonacciLevel::Both);
        seen.lock().unwrap().clear();

        let s = fsm.clear();
        assert_eq!(s, FilterState::default());
        assert_eq!(*seen.lock().unwrap(), vec![FilterState::default()]);
    }

    #[test]
    fn test_rejected_proximity_keeps_state_and_skips_callback() {
        let (mut fsm, seen) = recording_machine();
        assert_eq!(fsm.set_proximity(20.5), Err(FilterError::ProximityRange(20.5)));
        assert_eq!(fsm.set_proximity(-0.5), Err(FilterError::ProximityRange(-0.5)));
        assert_eq!(fsm.set_proximity(3.3), Err(FilterError::ProximityStep(3.3)));
        assert!(matches!(fsm.set_proximity(f64::NAN), Err(FilterError::ProximityRange(_))));
        assert_eq!(fsm.state(), FilterState::default());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_proximity_bounds_inclusive() {
        assert_eq!(validate_proximity(0.0), Ok(0.0));
        assert_eq!(validate_proximity(20.0), Ok(20.0));
        assert_eq!(validate_proximity(0.5), Ok(0.5));
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(parse_fibonacci_level("78.6"), Ok(FibonacciLevel::Fib786));
        assert_eq!(parse_fibonacci_level(" BOTH "), Ok(FibonacciLevel::Both));
        assert_eq!(parse_dilution("very-high"), Ok(DilutionFilter::VeryHigh));
        assert_eq!(
            parse_dilution("extreme"),
            Err(FilterError::UnknownDilution("extreme".to_string()))
        );
        assert!(parse_fibonacci_level("50").is_err());
    }

    #[test]
    fn test_matches_predicate_on_seed() {
        let cat = Catalog::seed();
        let visible = |f: FilterState| -> Vec<String> {
            cat.records()
                .iter()
                .filter(|r| f.matches(r))
                .map(|r| r.ticker.clone())
                .collect()
        };

        // default: proximity 5 -> SNDL (6.3) keluar
        assert_eq!(visible(FilterState::default()), vec!["BNGO", "TLRY", "RIOT", "AMC"]);

        let wide = FilterState::default().with_proximity(20.0);
        assert_eq!(visible(wide.with_fibonacci_level(FibonacciLevel::Fib618)), vec!["TLRY", "RIOT"]);
        assert_eq!(visible(wide.with_fibonacci_level(FibonacciLevel::Both)).len(), 5);
        assert_eq!(
            visible(wide.with_dilution_score(DilutionFilter::VeryHigh)),
            vec!["BNGO", "AMC"]
        );
        assert!(visible(wide.with_dilution_score(DilutionFilter::Low)).is_empty());
    }
}
