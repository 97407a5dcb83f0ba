use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("no data available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient history: need at least {required} bars, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(String),
}

impl PipelineError {
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_risk(message: impl Into<String>) -> Self {
        PipelineError::InvalidRiskParameters(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::DataUnavailable { .. } => "data_unavailable",
            PipelineError::InsufficientHistory { .. } => "insufficient_history",
            PipelineError::InvalidRiskParameters(_) => "invalid_risk_parameters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    MarketData,
    Sentiment,
    Sizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validation => "validation",
            Stage::MarketData => "market_data",
            Stage::Sentiment => "sentiment",
            Stage::Sizing => "sizing",
        };
        f.write_str(s)
    }
}

/// The single failure surfaced by the engine; no partial recommendation accompanies it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("recommendation for {symbol} failed at {stage}: {source}")]
pub struct RecommendationError {
    pub symbol: String,
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl RecommendationError {
    pub fn new(symbol: impl Into<String>, stage: Stage, source: PipelineError) -> Self {
        Self {
            symbol: symbol.into(),
            stage,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_error_names_stage_and_cause() {
        let err = RecommendationError::new(
            "AAPL",
            Stage::MarketData,
            PipelineError::data_unavailable("AAPL", "no candles"),
        );
        let msg = err.to_string();
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("market_data"));
        assert!(msg.contains("no candles"));
        assert_eq!(err.source.kind(), "data_unavailable");
    }
}
