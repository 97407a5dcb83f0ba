pub mod finnhub;
pub mod simulated;

use crate::config::{FallbackPolicy, Settings};
use crate::domain::series::{Bar, DataSource, Lookback, PriceSeries};
use crate::error::PipelineError;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub use finnhub::FinnhubClient;
pub use simulated::SimulatedMarketData;

#[async_trait::async_trait]
pub trait CandleSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_candles(
        &self,
        symbol: &str,
        lookback: Lookback,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>>;
}

#[derive(Clone)]
pub enum MarketDataMode {
    Live(Arc<dyn CandleSource>),
    Simulated,
}

#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
}

/// Trims and upper-cases a ticker; blank input is never a valid symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, PipelineError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(PipelineError::data_unavailable(raw, "symbol must be non-empty"));
    }
    Ok(symbol)
}

#[derive(Clone)]
pub struct MarketDataProvider {
    mode: MarketDataMode,
    fallback: FallbackPolicy,
    timeout: Duration,
    simulator: SimulatedMarketData,
}

impl MarketDataProvider {
    pub fn new(mode: MarketDataMode, simulator: SimulatedMarketData) -> Self {
        Self {
            mode,
            fallback: FallbackPolicy::Simulate,
            timeout: Duration::from_secs(crate::config::DEFAULT_PROVIDER_TIMEOUT_SECS),
            simulator,
        }
    }

    pub fn simulated(simulator: SimulatedMarketData) -> Self {
        Self::new(MarketDataMode::Simulated, simulator)
    }

    pub fn live(source: Arc<dyn CandleSource>, simulator: SimulatedMarketData) -> Self {
        Self::new(MarketDataMode::Live(source), simulator)
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let simulator = SimulatedMarketData::new(settings.simulation_seed);
        let provider = if settings.market_data_is_live() {
            let client = FinnhubClient::from_settings(settings)?;
            Self::live(Arc::new(client), simulator)
        } else {
            tracing::warn!("no market data API key configured; prices will be simulated");
            Self::simulated(simulator)
        };

        Ok(provider
            .with_fallback(settings.fallback_policy)
            .with_timeout(settings.provider_timeout))
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, MarketDataMode::Live(_))
    }

    pub async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<FetchedSeries, PipelineError> {
        let symbol = normalize_symbol(symbol)?;
        let now = Utc::now();

        let source = match &self.mode {
            MarketDataMode::Simulated => return Ok(self.simulate(&symbol, lookback, now)),
            MarketDataMode::Live(source) => source,
        };

        let failure = match tokio::time::timeout(self.timeout, source.fetch_candles(&symbol, lookback, now)).await {
            Ok(Ok(bars)) if !bars.is_empty() => {
                let series = PriceSeries::new(symbol.as_str(), lookback.timeframe, bars);
                return Ok(FetchedSeries {
                    series,
                    source: DataSource::Live,
                });
            }
            Ok(Ok(_)) => "provider returned no bars".to_string(),
            Ok(Err(err)) => format!("{err:#}"),
            Err(_) => format!("timed out after {:?}", self.timeout),
        };

        match self.fallback {
            FallbackPolicy::Simulate => {
                tracing::warn!(
                    %symbol,
                    provider = source.provider_name(),
                    error = %failure,
                    "live market data fetch failed; falling back to simulated prices"
                );
                Ok(self.simulate(&symbol, lookback, now))
            }
            FallbackPolicy::Fail => {
                tracing::error!(
                    %symbol,
                    provider = source.provider_name(),
                    error = %failure,
                    "live market data fetch failed"
                );
                Err(PipelineError::data_unavailable(symbol, failure))
            }
        }
    }

    fn simulate(&self, symbol: &str, lookback: Lookback, now: DateTime<Utc>) -> FetchedSeries {
        FetchedSeries {
            series: self.simulator.generate(symbol, lookback.timeframe, now),
            source: DataSource::Simulated,
        }
    }
}
