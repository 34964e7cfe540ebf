// ===============================
// src/catalog.rs
// ===============================
//
// Katalog saham read-only untuk leaderboard.
// - Diinject ke dashboard (bukan global), supaya test bisa pakai katalog sendiri.
// - Urutan input = urutan tampil (RankMode::Display, default).
// - RankMode::Score: sort desc by reversal_score, tie -> ticker asc (stable).
//
use ahash::AHashMap as HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{DilutionRisk, StockRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate ticker in catalog: {0}")]
    DuplicateTicker(String),
    #[error("reversal score {score} out of range 0..=100 for {ticker}")]
    ScoreRange { ticker: String, score: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankMode {
    #[default]
    Display,
    Score,
}

impl RankMode {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "display" | "order" => Some(RankMode::Display),
            "score" => Some(RankMode::Score),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMode::Display => "display",
            RankMode::Score => "score",
        }
    }
}

/// Bucket presentasi untuk reversal score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Critical,
    Warning,
    Info,
    Neutral,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 90 => ScoreTier::Critical,
            s if s >= 80 => ScoreTier::Warning,
            s if s >= 70 => ScoreTier::Info,
            _ => ScoreTier::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Critical => "critical",
            ScoreTier::Warning => "warning",
            ScoreTier::Info => "info",
            ScoreTier::Neutral => "neutral",
        }
    }
}

pub fn volume_ratio_pct(volume: u64, avg_volume: u64) -> u64 {
    if avg_volume == 0 {
        return 0;
    }
    ((volume as f64 / avg_volume as f64) * 100.0).round() as u64
}

pub fn is_volume_hot(volume: u64, avg_volume: u64) -> bool {
    volume > avg_volume.saturating_mul(2)
}

#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub record: Arc<StockRecord>,
    pub volume_ratio_pct: u64,
    pub volume_hot: bool,
    pub tier: ScoreTier,
}

impl LeaderboardRow {
    fn new(rank: usize, record: Arc<StockRecord>) -> Self {
        Self {
            rank,
            volume_ratio_pct: volume_ratio_pct(record.volume, record.avg_volume),
            volume_hot: is_volume_hot(record.volume, record.avg_volume),
            tier: ScoreTier::from_score(record.reversal_score),
            record,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<Arc<StockRecord>>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(records: Vec<StockRecord>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            if r.reversal_score > 100 {
                return Err(CatalogError::ScoreRange {
                    ticker: r.ticker.clone(),
                    score: r.reversal_score,
                });
            }
            if index.insert(r.ticker.to_ascii_uppercase(), i).is_some() {
                return Err(CatalogError::DuplicateTicker(r.ticker.clone()));
            }
        }
        Ok(Self {
            records: records.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    pub fn from_json_str(s: &str) -> Result<Self, CatalogError> {
        let records: Vec<StockRecord> = serde_json::from_str(s)?;
        Self::new(records)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Lima record bawaan leaderboard
    pub fn seed() -> Self {
        let records = vec![
            rec("BNGO", 94, "VWAP Rejection", 8.45, -0.23, -2.65, DilutionRisk::VeryHigh, 2_840_000, 1_200_000, 2.1, 78.6, 76.4),
            rec("TLRY", 89, "Fib 61.8%", 12.67, 0.34, 2.76, DilutionRisk::High, 1_950_000, 850_000, 4.7, 61.8, 73.2),
            rec("SNDL", 87, "Overbought RSI", 3.21, 0.12, 3.88, DilutionRisk::Medium, 5_600_000, 2_100_000, 6.3, 78.6, 79.1),
            rec("RIOT", 84, "Volume Spike", 15.89, -0.67, -4.05, DilutionRisk::High, 3_200_000, 1_400_000, 1.8, 61.8, 68.7),
            rec("AMC", 82, "VWAP Rejection", 7.23, -0.45, -5.86, DilutionRisk::VeryHigh, 8_900_000, 3_500_000, 3.2, 78.6, 71.5),
        ];
        Self {
            index: records
                .iter()
                .enumerate()
                .map(|(i, r)| (r.ticker.clone(), i))
                .collect(),
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<Arc<StockRecord>> {
        self.index
            .get(&ticker.trim().to_ascii_uppercase())
            .map(|&i| self.records[i].clone())
    }

    pub fn records(&self) -> &[Arc<StockRecord>] {
        &self.records
    }

    pub fn rows(&self, mode: RankMode) -> Vec<LeaderboardRow> {
        self.rows_where(mode, |_| true)
    }

    /// Rank diberikan setelah filter, jadi selalu 1..N untuk baris yang tampil
    pub fn rows_where<F>(&self, mode: RankMode, mut keep: F) -> Vec<LeaderboardRow>
    where
        F: FnMut(&StockRecord) -> bool,
    {
        let mut picked: Vec<Arc<StockRecord>> =
            self.records.iter().filter(|r| keep(r)).cloned().collect();
        if mode == RankMode::Score {
            picked.sort_by(|a, b| {
                b.reversal_score
                    .cmp(&a.reversal_score)
                    .then_with(|| a.ticker.cmp(&b.ticker))
            });
        }
        picked
            .into_iter()
            .enumerate()
            .map(|(i, r)| LeaderboardRow::new(i + 1, r))
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn rec(
    ticker: &str,
    reversal_score: u8,
    key_signal: &str,
    price: f64,
    price_change: f64,
    price_change_percent: f64,
    dilution_risk: DilutionRisk,
    volume: u64,
    avg_volume: u64,
    vwap_distance: f64,
    fib_level: f64,
    rsi: f64,
) -> StockRecord {
    StockRecord {
        ticker: ticker.to_string(),
        reversal_score,
        key_signal: key_signal.to_string(),
        price,
        price_change,
        price_change_percent,
        dilution_risk,
        volume,
        avg_volume,
        vwap_distance,
        fib_level,
        rsi,
    }
}
