pub mod decision;

use crate::config::Settings;
use crate::domain::recommendation::{Recommendation, RecommendationParts};
use crate::domain::series::Lookback;
use crate::error::{PipelineError, RecommendationError, Stage};
use crate::market::MarketDataProvider;
use crate::personality::PersonalityClassifier;
use crate::risk::{RiskParameters, RiskSizer};
use crate::sentiment::SentimentScorer;

pub use decision::{decide, Decision, Rationale, DECISION_TABLE};

#[derive(Clone)]
pub struct RecommendationEngine {
    market: MarketDataProvider,
    sentiment: SentimentScorer,
    classifier: PersonalityClassifier,
    sizer: RiskSizer,
}

impl RecommendationEngine {
    pub fn new(market: MarketDataProvider, sentiment: SentimentScorer) -> Self {
        Self {
            market,
            sentiment,
            classifier: PersonalityClassifier::default(),
            sizer: RiskSizer::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: PersonalityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_sizer(mut self, sizer: RiskSizer) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let market = MarketDataProvider::from_settings(settings)?;
        let sentiment = SentimentScorer::from_settings(settings)?;
        tracing::info!(mode = %settings.mode_summary(), "recommendation engine ready");
        Ok(Self::new(market, sentiment))
    }

    pub async fn recommend(
        &self,
        symbol: &str,
        params: &RiskParameters,
    ) -> Result<Recommendation, RecommendationError> {
        self.recommend_with(symbol, Lookback::default(), params).await
    }

    pub async fn recommend_with(
        &self,
        symbol: &str,
        lookback: Lookback,
        params: &RiskParameters,
    ) -> Result<Recommendation, RecommendationError> {
        let display_symbol = symbol.trim().to_ascii_uppercase();
        let fail = |stage: Stage, err: PipelineError| {
            tracing::error!(symbol = %display_symbol, %stage, error = %err, "recommendation failed");
            RecommendationError::new(display_symbol.clone(), stage, err)
        };

        tracing::info!(symbol = %display_symbol, timeframe = %lookback.timeframe, "starting analysis");

        params.validate().map_err(|e| fail(Stage::Validation, e))?;

        let fetched = self
            .market
            .fetch(symbol, lookback)
            .await
            .map_err(|e| fail(Stage::MarketData, e))?;
        let series = &fetched.series;
        let latest_price = series.latest_close().ok_or_else(|| {
            fail(
                Stage::MarketData,
                PipelineError::data_unavailable(series.symbol(), "price series is empty"),
            )
        })?;

        let sentiment = self
            .sentiment
            .score(symbol)
            .await
            .map_err(|e| fail(Stage::Sentiment, e))?;

        let (personality, metrics) = self.classifier.assess(series);
        let decision = decide(personality, sentiment.bucket());

        let volatility = metrics.map(|m| m.bar_volatility).unwrap_or(0.0);
        let position = self
            .sizer
            .size_position(params, latest_price, volatility)
            .map_err(|e| fail(Stage::Sizing, e))?
            .for_action(decision.signal.action(), latest_price, self.sizer.reward_ratio);

        let recommendation = Recommendation::from_parts(RecommendationParts {
            symbol: series.symbol().to_string(),
            timeframe: lookback.timeframe,
            latest_price,
            data_source: fetched.source,
            metrics,
            personality,
            confidence: decision::confidence(&decision, sentiment.score),
            reason: decision::reason(&decision, personality, sentiment.score),
            sentiment,
            position,
            signal: decision.signal,
        });

        tracing::info!(
            symbol = recommendation.symbol(),
            id = %recommendation.id(),
            signal = recommendation.signal().label(),
            confidence = recommendation.confidence(),
            shares = recommendation.position().shares,
            "analysis complete"
        );
        Ok(recommendation)
    }
}
