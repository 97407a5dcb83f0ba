use crate::config::Settings;
use crate::domain::series::{Bar, Lookback};
use crate::market::CandleSource;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const CANDLE_PATH: &str = "/api/v1/stock/candle";

#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_finnhub_api_key()?.to_string();
        let base_url = settings.finnhub_base_url().to_string();

        // The provider applies its own timeout too; this one bounds the socket.
        let http = reqwest::Client::builder()
            .timeout(settings.provider_timeout + Duration::from_secs(1))
            .build()
            .context("failed to build finnhub http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CANDLE_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Finnhub-Token", HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl CandleSource for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        lookback: Lookback,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let (from, to) = request_window(lookback, now)?;

        tracing::info!(symbol, timeframe = %lookback.timeframe, days = lookback.days, "fetching candles from finnhub");

        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("symbol", symbol.to_string()),
                ("resolution", lookback.timeframe.resolution().to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ])
            .send()
            .await
            .context("finnhub request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read finnhub response")?;

        if !status.is_success() {
            anyhow::bail!("finnhub HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<CandleResponse>(&text)
            .with_context(|| format!("finnhub response is not a candle payload: {text}"))?;
        let bars = parsed.into_bars()?;

        tracing::info!(symbol, bars = bars.len(), "fetched candles from finnhub");
        Ok(bars)
    }
}

fn request_window(lookback: Lookback, now: DateTime<Utc>) -> Result<(i64, i64)> {
    let from = now
        .checked_sub_signed(lookback.span())
        .with_context(|| format!("lookback of {} days is out of range", lookback.days))?;
    Ok((from.timestamp(), now.timestamp()))
}

#[derive(Debug, Clone, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

impl CandleResponse {
    fn into_bars(self) -> Result<Vec<Bar>> {
        anyhow::ensure!(
            self.s == "ok" && !self.c.is_empty(),
            "finnhub returned no candle data (status={}); the symbol may be invalid or the key may lack access",
            self.s
        );

        let n = self.c.len();
        anyhow::ensure!(
            [self.o.len(), self.h.len(), self.l.len(), self.v.len(), self.t.len()]
                .iter()
                .all(|len| *len == n),
            "finnhub candle arrays have mismatched lengths"
        );

        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let timestamp = DateTime::<Utc>::from_timestamp(self.t[i], 0)
                .with_context(|| format!("invalid candle timestamp: {}", self.t[i]))?;
            bars.push(Bar {
                timestamp,
                open: self.o[i],
                high: self.h[i],
                low: self.l[i],
                close: self.c[i],
                volume: self.v[i],
            });
        }
        Ok(bars)
    }
}
