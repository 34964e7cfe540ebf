// ===============================
// src/domain.rs
// ===============================
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

pub fn now_ns() -> i128 {
    Utc::now().timestamp_nanos_opt().unwrap_or(0) as i128
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DilutionRisk {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl DilutionRisk {
    pub fn label(&self) -> &'static str {
        match self {
            DilutionRisk::Low => "Low",
            DilutionRisk::Medium => "Medium",
            DilutionRisk::High => "High",
            DilutionRisk::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for DilutionRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Satu baris leaderboard. Immutable selama proses hidup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub ticker: String,
    pub reversal_score: u8,
    pub key_signal: String,
    pub price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub dilution_risk: DilutionRisk,
    pub volume: u64,
    pub avg_volume: u64,
    pub vwap_distance: f64,
    pub fib_level: f64,
    pub rsi: f64,
}

impl StockRecord {
    /// volume / avgVolume; 0 kalau avgVolume kosong
    pub fn volume_ratio(&self) -> f64 {
        if self.avg_volume == 0 {
            0.0
        } else {
            self.volume as f64 / self.avg_volume as f64
        }
    }

    pub fn is_up(&self) -> bool {
        self.price_change >= 0.0
    }
}

// ===== Filter values =====
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FibonacciLevel {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "61.8")]
    Fib618,
    #[serde(rename = "78.6")]
    Fib786,
    #[serde(rename = "both")]
    Both,
}

impl FibonacciLevel {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(FibonacciLevel::All),
            "61.8" | "618" => Some(FibonacciLevel::Fib618),
            "78.6" | "786" => Some(FibonacciLevel::Fib786),
            "both" => Some(FibonacciLevel::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FibonacciLevel::All => "all",
            FibonacciLevel::Fib618 => "61.8",
            FibonacciLevel::Fib786 => "78.6",
            FibonacciLevel::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DilutionFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DilutionFilter {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(DilutionFilter::All),
            "low" => Some(DilutionFilter::Low),
            "medium" => Some(DilutionFilter::Medium),
            "high" => Some(DilutionFilter::High),
            "very-high" | "very_high" | "veryhigh" => Some(DilutionFilter::VeryHigh),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DilutionFilter::All => "all",
            DilutionFilter::Low => "low",
            DilutionFilter::Medium => "medium",
            DilutionFilter::High => "high",
            DilutionFilter::VeryHigh => "very-high",
        }
    }

    /// None = "all" (tidak membatasi)
    pub fn risk(&self) -> Option<DilutionRisk> {
        match self {
            DilutionFilter::All => None,
            DilutionFilter::Low => Some(DilutionRisk::Low),
            DilutionFilter::Medium => Some(DilutionRisk::Medium),
            DilutionFilter::High => Some(DilutionRisk::High),
            DilutionFilter::VeryHigh => Some(DilutionRisk::VeryHigh),
        }
    }
}

pub const DEFAULT_VWAP_PROXIMITY: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub vwap_proximity: f64,
    pub fibonacci_level: FibonacciLevel,
    pub dilution_score: DilutionFilter,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            vwap_proximity: DEFAULT_VWAP_PROXIMITY,
            fibonacci_level: FibonacciLevel::All,
            dilution_score: DilutionFilter::All,
        }
    }
}

// Snapshot terakhir dari page container (dipublish via watch channel)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub ts_ns: i128,
    pub filters: FilterState,
    pub selected: Option<String>,
    pub panel_open: bool,
    // ticker terakhir yang diklik (tetap ada setelah deferred clear)
    pub highlighted: Option<String>,
    pub visible: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Filters { ts_ns: i128, filters: FilterState },
    Select { ts_ns: i128, ticker: String },
    PanelClosed { ts_ns: i128, ticker: Option<String> },
    SelectionCleared { ts_ns: i128, ticker: String },
    Note(String),
}
