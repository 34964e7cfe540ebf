// ===============================
// src/commentary.rs
// ===============================
//
// Komentar "AI agent" untuk panel deep-dive. Murni templating dari field record,
// tidak ada inferensi: input sama -> output sama.
//
use serde::Serialize;

use crate::catalog::volume_ratio_pct;
use crate::domain::StockRecord;

/// Bulatkan ke 1 desimal, tie naik (76.25 -> 76.3), bukan ties-to-even milik `{:.1}`
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInsight {
    pub agent: &'static str,
    pub role: &'static str,
    pub insight: String,
    pub confidence: u8,
}

pub fn insights(stock: &StockRecord) -> [AgentInsight; 3] {
    [
        AgentInsight {
            agent: "Grant",
            role: "Short Trading Specialist",
            insight: format!(
                "Strong reversal setup at {}% Fibonacci resistance. VWAP rejection pattern forming with {}% distance suggests institutional selling pressure.",
                stock.fib_level, stock.vwap_distance
            ),
            confidence: 92,
        },
        AgentInsight {
            agent: "Sophia",
            role: "Pattern Recognition",
            insight: format!(
                "Volume spike to {}% of average indicates potential exhaustion. RSI at {:.1} confirms overbought conditions.",
                volume_ratio_pct(stock.volume, stock.avg_volume),
                round1(stock.rsi)
            ),
            confidence: 87,
        },
        AgentInsight {
            agent: "Phil",
            role: "Investment Banker",
            insight: format!(
                "{} dilution risk based on recent warrant activity and cash runway analysis. Monitor for upcoming offering announcements.",
                stock.dilution_risk
            ),
            confidence: 89,
        },
    ]
}
