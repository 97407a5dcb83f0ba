use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Weekly,
    Hourly,
}

impl Timeframe {
    /// Candle resolution code understood by the market data vendor.
    pub fn resolution(self) -> &'static str {
        match self {
            Timeframe::Daily => "D",
            Timeframe::Weekly => "W",
            Timeframe::Hourly => "60",
        }
    }

    pub fn default_lookback_days(self) -> u32 {
        match self {
            Timeframe::Daily | Timeframe::Weekly => 365,
            Timeframe::Hourly => 30,
        }
    }

    pub fn bar_spacing(self) -> Duration {
        match self {
            Timeframe::Daily => Duration::days(1),
            Timeframe::Weekly => Duration::weeks(1),
            Timeframe::Hourly => Duration::hours(1),
        }
    }

    /// Bars per trading year, used to annualize return volatility.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Timeframe::Daily => 252.0,
            Timeframe::Weekly => 52.0,
            Timeframe::Hourly => 252.0 * 6.5,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Hourly => "hourly",
        };
        f.write_str(s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Timeframe::Daily),
            "weekly" | "w" | "1w" => Ok(Timeframe::Weekly),
            "hourly" | "60" | "60min" | "1h" => Ok(Timeframe::Hourly),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

pub const MAX_LOOKBACK_DAYS: u32 = 3_650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    pub timeframe: Timeframe,
    pub days: u32,
}

impl Lookback {
    pub fn new(timeframe: Timeframe, days: u32) -> Self {
        Self { timeframe, days }
    }

    pub fn default_for(timeframe: Timeframe) -> Self {
        Self::new(timeframe, timeframe.default_lookback_days())
    }

    pub fn is_within_limit(&self) -> bool {
        self.days > 0 && self.days <= MAX_LOOKBACK_DAYS
    }

    /// Requested history, capped at `MAX_LOOKBACK_DAYS`.
    pub fn span(&self) -> Duration {
        Duration::days(i64::from(self.days.min(MAX_LOOKBACK_DAYS)))
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::default_for(Timeframe::Daily)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars for one symbol, always in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Sorts bars chronologically; a repeated timestamp keeps the last bar seen.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);

        let mut ordered: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match ordered.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => ordered.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            timeframe,
            bars: ordered,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}
