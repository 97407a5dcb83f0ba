use crate::domain::series::{DataSource, Timeframe};
use crate::personality::{PersonalityLabel, SeriesMetrics};
use crate::risk::PositionSize;
use crate::sentiment::SentimentScore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Hold => "hold",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Signal {
    pub fn action(self) -> Action {
        match self {
            Signal::StrongBuy | Signal::Buy => Action::Buy,
            Signal::Hold => Action::Hold,
            Signal::Sell | Signal::StrongSell => Action::Sell,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG BUY",
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG SELL",
        }
    }
}

/// Outcome of one analysis request. Built once by the engine and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    id: Uuid,
    symbol: String,
    generated_at: DateTime<Utc>,
    timeframe: Timeframe,
    latest_price: f64,
    data_source: DataSource,
    metrics: Option<SeriesMetrics>,
    personality: PersonalityLabel,
    sentiment: SentimentScore,
    position: PositionSize,
    signal: Signal,
    action: Action,
    confidence: f64,
    reason: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RecommendationParts {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub latest_price: f64,
    pub data_source: DataSource,
    pub metrics: Option<SeriesMetrics>,
    pub personality: PersonalityLabel,
    pub sentiment: SentimentScore,
    pub position: PositionSize,
    pub signal: Signal,
    pub confidence: f64,
    pub reason: String,
}

impl Recommendation {
    pub(crate) fn from_parts(parts: RecommendationParts) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: parts.symbol,
            generated_at: Utc::now(),
            timeframe: parts.timeframe,
            latest_price: parts.latest_price,
            data_source: parts.data_source,
            metrics: parts.metrics,
            personality: parts.personality,
            sentiment: parts.sentiment,
            position: parts.position,
            signal: parts.signal,
            action: parts.signal.action(),
            confidence: parts.confidence.clamp(0.0, 1.0),
            reason: parts.reason,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn latest_price(&self) -> f64 {
        self.latest_price
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn metrics(&self) -> Option<&SeriesMetrics> {
        self.metrics.as_ref()
    }

    pub fn personality(&self) -> PersonalityLabel {
        self.personality
    }

    pub fn sentiment(&self) -> &SentimentScore {
        &self.sentiment
    }

    pub fn position(&self) -> &PositionSize {
        &self.position
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_signal_maps_to_one_action() {
        assert_eq!(Signal::StrongBuy.action(), Action::Buy);
        assert_eq!(Signal::Buy.action(), Action::Buy);
        assert_eq!(Signal::Hold.action(), Action::Hold);
        assert_eq!(Signal::Sell.action(), Action::Sell);
        assert_eq!(Signal::StrongSell.action(), Action::Sell);
    }

    #[test]
    fn actions_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Action::Buy).unwrap(), "buy");
        assert_eq!(serde_json::to_value(Signal::StrongSell).unwrap(), "strong_sell");
    }
}
