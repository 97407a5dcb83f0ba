pub mod domain;
pub mod engine;
pub mod error;
pub mod market;
pub mod personality;
pub mod risk;
pub mod sentiment;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io";
    pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org";
    pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_PORTFOLIO_VALUE: f64 = 100_000.0;
    pub const DEFAULT_RISK_PER_TRADE: f64 = 0.02;

    /// What a leaf provider does when its live fetch fails.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FallbackPolicy {
        Simulate,
        Fail,
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub finnhub_api_key: Option<String>,
        pub finnhub_base_url: Option<String>,
        pub news_api_key: Option<String>,
        pub news_api_base_url: Option<String>,
        pub trading_api_key: Option<String>,
        pub trading_api_secret: Option<String>,
        pub trading_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub provider_timeout: Duration,
        pub fallback_policy: FallbackPolicy,
        pub simulation_seed: Option<u64>,
        pub portfolio_value: f64,
        pub risk_per_trade: f64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup. Blank values count as unset and
        /// unparsable numeric knobs fall back to their defaults.
        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let provider_timeout_secs = var("PROVIDER_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);

            let fallback_policy = match var("SIMULATION_FALLBACK")
                .map(|s| s.trim().to_ascii_lowercase())
                .as_deref()
            {
                Some("false") | Some("0") | Some("no") | Some("off") => FallbackPolicy::Fail,
                _ => FallbackPolicy::Simulate,
            };

            Ok(Self {
                finnhub_api_key: var("FINNHUB_API_KEY"),
                finnhub_base_url: var("FINNHUB_BASE_URL"),
                news_api_key: var("NEWS_API_KEY"),
                news_api_base_url: var("NEWS_API_BASE_URL"),
                trading_api_key: var("TRADING_API_KEY"),
                trading_api_secret: var("TRADING_API_SECRET"),
                trading_base_url: var("TRADING_BASE_URL"),
                sentry_dsn: var("SENTRY_DSN"),
                provider_timeout: Duration::from_secs(provider_timeout_secs),
                fallback_policy,
                simulation_seed: var("SIMULATION_SEED").and_then(|s| s.trim().parse::<u64>().ok()),
                portfolio_value: var("PORTFOLIO_VALUE")
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .unwrap_or(DEFAULT_PORTFOLIO_VALUE),
                risk_per_trade: var("RISK_PER_TRADE")
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .unwrap_or(DEFAULT_RISK_PER_TRADE),
            })
        }

        pub fn require_finnhub_api_key(&self) -> anyhow::Result<&str> {
            self.finnhub_api_key
                .as_deref()
                .context("FINNHUB_API_KEY is required")
        }

        pub fn require_news_api_key(&self) -> anyhow::Result<&str> {
            self.news_api_key
                .as_deref()
                .context("NEWS_API_KEY is required")
        }

        pub fn finnhub_base_url(&self) -> &str {
            self.finnhub_base_url
                .as_deref()
                .unwrap_or(DEFAULT_FINNHUB_BASE_URL)
        }

        pub fn news_api_base_url(&self) -> &str {
            self.news_api_base_url
                .as_deref()
                .unwrap_or(DEFAULT_NEWS_API_BASE_URL)
        }

        pub fn default_risk_parameters(&self) -> crate::risk::RiskParameters {
            crate::risk::RiskParameters {
                portfolio_value: self.portfolio_value,
                risk_fraction: self.risk_per_trade,
                stop_distance: None,
            }
        }

        pub fn market_data_is_live(&self) -> bool {
            self.finnhub_api_key.is_some()
        }

        pub fn sentiment_is_live(&self) -> bool {
            self.news_api_key.is_some()
        }

        pub fn trading_is_configured(&self) -> bool {
            self.trading_api_key.is_some() && self.trading_api_secret.is_some()
        }

        pub fn mode_summary(&self) -> String {
            fn mode(live: bool) -> &'static str {
                if live {
                    "live"
                } else {
                    "simulated"
                }
            }

            format!(
                "market_data={} sentiment={} trading={} fallback={:?}",
                mode(self.market_data_is_live()),
                mode(self.sentiment_is_live()),
                if self.trading_is_configured() {
                    "configured"
                } else {
                    "not_configured"
                },
                self.fallback_policy,
            )
        }
    }

}
