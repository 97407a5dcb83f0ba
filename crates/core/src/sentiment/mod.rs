pub mod lexicon;
pub mod newsapi;

use crate::config::{FallbackPolicy, Settings};
use crate::domain::series::DataSource;
use crate::error::PipelineError;
use crate::market::normalize_symbol;
use crate::market::simulated::request_rng;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use lexicon::{LexicalScore, LexicalScorer};
pub use newsapi::NewsApiClient;

const SIMULATED_RANGE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub description: Option<String>,
}

#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<Headline>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentScore {
    /// Polarity in [-1, 1].
    pub score: f64,
    pub source: DataSource,
    pub headline_count: usize,
    pub summary: String,
}

impl SentimentScore {
    pub fn bucket(&self) -> SentimentBucket {
        SentimentBucket::from_score(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBucket {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl SentimentBucket {
    pub const ALL: [SentimentBucket; 5] = [
        SentimentBucket::VeryNegative,
        SentimentBucket::Negative,
        SentimentBucket::Neutral,
        SentimentBucket::Positive,
        SentimentBucket::VeryPositive,
    ];

    /// Bucket edges: +-0.15 separates neutral, +-0.5 separates the strong buckets.
    pub fn from_score(score: f64) -> Self {
        if score < -0.5 {
            SentimentBucket::VeryNegative
        } else if score < -0.15 {
            SentimentBucket::Negative
        } else if score <= 0.15 {
            SentimentBucket::Neutral
        } else if score <= 0.5 {
            SentimentBucket::Positive
        } else {
            SentimentBucket::VeryPositive
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SentimentBucket::VeryNegative => 0,
            SentimentBucket::Negative => 1,
            SentimentBucket::Neutral => 2,
            SentimentBucket::Positive => 3,
            SentimentBucket::VeryPositive => 4,
        }
    }
}

#[derive(Clone)]
pub enum SentimentMode {
    Live(Arc<dyn HeadlineSource>),
    Simulated,
}

#[derive(Clone)]
pub struct SentimentScorer {
    mode: SentimentMode,
    fallback: FallbackPolicy,
    timeout: Duration,
    lexicon: LexicalScorer,
    seed: Option<u64>,
}

impl SentimentScorer {
    pub fn new(mode: SentimentMode) -> Self {
        Self {
            mode,
            fallback: FallbackPolicy::Simulate,
            timeout: Duration::from_secs(crate::config::DEFAULT_PROVIDER_TIMEOUT_SECS),
            lexicon: LexicalScorer::default(),
            seed: None,
        }
    }

    pub fn simulated() -> Self {
        Self::new(SentimentMode::Simulated)
    }

    pub fn live(source: Arc<dyn HeadlineSource>) -> Self {
        Self::new(SentimentMode::Live(source))
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let scorer = if settings.sentiment_is_live() {
            let client = NewsApiClient::from_settings(settings)?;
            Self::live(Arc::new(client))
        } else {
            tracing::warn!("no news API key configured; sentiment will be simulated");
            Self::simulated()
        };

        Ok(scorer
            .with_fallback(settings.fallback_policy)
            .with_timeout(settings.provider_timeout)
            .with_seed(settings.simulation_seed))
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, SentimentMode::Live(_))
    }

    pub async fn score(&self, symbol: &str) -> Result<SentimentScore, PipelineError> {
        let symbol = normalize_symbol(symbol)?;

        let source = match &self.mode {
            SentimentMode::Simulated => return Ok(self.simulate(&symbol)),
            SentimentMode::Live(source) => source,
        };

        let failure = match tokio::time::timeout(self.timeout, source.fetch_headlines(&symbol)).await {
            Ok(Ok(headlines)) => return Ok(self.score_headlines(&symbol, &headlines)),
            Ok(Err(err)) => format!("{err:#}"),
            Err(_) => format!("timed out after {:?}", self.timeout),
        };

        match self.fallback {
            FallbackPolicy::Simulate => {
                tracing::warn!(
                    %symbol,
                    provider = source.provider_name(),
                    error = %failure,
                    "live sentiment fetch failed; falling back to simulated sentiment"
                );
                Ok(self.simulate(&symbol))
            }
            FallbackPolicy::Fail => {
                tracing::error!(
                    %symbol,
                    provider = source.provider_name(),
                    error = %failure,
                    "live sentiment fetch failed"
                );
                Err(PipelineError::data_unavailable(symbol, failure))
            }
        }
    }

    fn score_headlines(&self, symbol: &str, headlines: &[Headline]) -> SentimentScore {
        let lexical = self.lexicon.score(headlines);
        let summary = if headlines.is_empty() {
            format!("No recent headlines found for {symbol}; sentiment treated as neutral.")
        } else if lexical.scored == 0 {
            format!(
                "{} recent headlines for {symbol} carried no clear sentiment.",
                headlines.len()
            )
        } else {
            format!(
                "Scored {} of {} recent headlines for {symbol}; average polarity {:.2}.",
                lexical.scored,
                headlines.len(),
                lexical.score
            )
        };

        tracing::info!(symbol, headlines = headlines.len(), score = lexical.score, "scored live sentiment");
        SentimentScore {
            score: lexical.score,
            source: DataSource::Live,
            headline_count: headlines.len(),
            summary,
        }
    }

    fn simulate(&self, symbol: &str) -> SentimentScore {
        let mut rng = request_rng(self.seed, symbol, 0x4E45_5753);
        let score = rng.gen_range(-SIMULATED_RANGE..=SIMULATED_RANGE);
        tracing::info!(symbol, score, "generated simulated sentiment");

        SentimentScore {
            score,
            source: DataSource::Simulated,
            headline_count: 0,
            summary: "Sentiment is simulated; the recommendation leans on price action.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticHeadlines(Vec<&'static str>);

    #[async_trait::async_trait]
    impl HeadlineSource for StaticHeadlines {
        fn provider_name(&self) -> &'static str {
            "static"
        }

        async fn fetch_headlines(&self, _symbol: &str) -> Result<Vec<Headline>> {
            Ok(self
                .0
                .iter()
                .map(|t| Headline {
                    title: t.to_string(),
                    description: None,
                })
                .collect())
        }
    }

    struct BrokenHeadlines;

    #[async_trait::async_trait]
    impl HeadlineSource for BrokenHeadlines {
        fn provider_name(&self) -> &'static str {
            "broken"
        }

        async fn fetch_headlines(&self, _symbol: &str) -> Result<Vec<Headline>> {
            anyhow::bail!("503 service unavailable")
        }
    }

    struct SlowHeadlines;

    #[async_trait::async_trait]
    impl HeadlineSource for SlowHeadlines {
        fn provider_name(&self) -> &'static str {
            "slow"
        }

        async fn fetch_headlines(&self, _symbol: &str) -> Result<Vec<Headline>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(SentimentBucket::from_score(-0.9), SentimentBucket::VeryNegative);
        assert_eq!(SentimentBucket::from_score(-0.5), SentimentBucket::Negative);
        assert_eq!(SentimentBucket::from_score(-0.15), SentimentBucket::Neutral);
        assert_eq!(SentimentBucket::from_score(0.15), SentimentBucket::Neutral);
        assert_eq!(SentimentBucket::from_score(0.16), SentimentBucket::Positive);
        assert_eq!(SentimentBucket::from_score(0.5), SentimentBucket::Positive);
        assert_eq!(SentimentBucket::from_score(0.6), SentimentBucket::VeryPositive);
    }

    #[tokio::test]
    async fn simulated_scores_stay_in_range_and_are_seedable() {
        let scorer = SentimentScorer::simulated().with_seed(Some(11));
        let a = scorer.score("AAPL").await.unwrap();
        let b = scorer.score("AAPL").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.source, DataSource::Simulated);
        assert!((-SIMULATED_RANGE..=SIMULATED_RANGE).contains(&a.score));
    }

    #[tokio::test]
    async fn live_headlines_are_scored_lexically() {
        let scorer = SentimentScorer::live(Arc::new(StaticHeadlines(vec![
            "Shares surge after earnings beat",
            "Analysts upgrade outlook",
        ])));
        let out = scorer.score("AAPL").await.unwrap();
        assert_eq!(out.source, DataSource::Live);
        assert_eq!(out.headline_count, 2);
        assert!(out.score > 0.5);
    }

    #[tokio::test]
    async fn no_headlines_is_neutral_not_an_error() {
        let scorer = SentimentScorer::live(Arc::new(StaticHeadlines(Vec::new())))
            .with_fallback(FallbackPolicy::Fail);
        let out = scorer.score("AAPL").await.unwrap();
        assert_eq!(out.score, 0.0);
        assert_eq!(out.bucket(), SentimentBucket::Neutral);
    }

    #[tokio::test]
    async fn fallback_policy_controls_transient_failures() {
        let degrade = SentimentScorer::live(Arc::new(BrokenHeadlines))
            .with_fallback(FallbackPolicy::Simulate);
        assert_eq!(degrade.score("AAPL").await.unwrap().source, DataSource::Simulated);

        let strict = SentimentScorer::live(Arc::new(BrokenHeadlines))
            .with_fallback(FallbackPolicy::Fail);
        let err = strict.score("AAPL").await.unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_source_times_out_per_policy() {
        let strict = SentimentScorer::live(Arc::new(SlowHeadlines))
            .with_fallback(FallbackPolicy::Fail)
            .with_timeout(Duration::from_millis(50));
        let started = std::time::Instant::now();
        let err = strict.score("AAPL").await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
        assert!(err.to_string().contains("timed out"));

        let degrade = SentimentScorer::live(Arc::new(SlowHeadlines))
            .with_fallback(FallbackPolicy::Simulate)
            .with_timeout(Duration::from_millis(50));
        let out = degrade.score("AAPL").await.unwrap();
        assert_eq!(out.source, DataSource::Simulated);
    }
}
