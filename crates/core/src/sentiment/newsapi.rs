use crate::config::Settings;
use crate::sentiment::{Headline, HeadlineSource};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const EVERYTHING_PATH: &str = "/v2/everything";
const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_news_api_key()?.to_string();
        let base_url = settings.news_api_base_url().to_string();

        let http = reqwest::Client::builder()
            .timeout(settings.provider_timeout + Duration::from_secs(1))
            .build()
            .context("failed to build news http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), EVERYTHING_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl HeadlineSource for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<Headline>> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("q", symbol.to_string()),
                ("language", "en".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .context("news request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read news response")?;
        if !status.is_success() {
            anyhow::bail!("news HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<EverythingResponse>(&text)
            .with_context(|| format!("news response is not an article list: {text}"))?;
        parsed.into_headlines()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Clone, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl EverythingResponse {
    fn into_headlines(self) -> Result<Vec<Headline>> {
        anyhow::ensure!(
            self.status == "ok",
            "news API returned status={}: {}",
            self.status,
            self.message.unwrap_or_default()
        );

        Ok(self
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title?.trim().to_string();
                if title.is_empty() {
                    return None;
                }
                Some(Headline {
                    title,
                    description: a.description.filter(|d| !d.trim().is_empty()),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_titled_articles_only() {
        let parsed: EverythingResponse = serde_json::from_value(json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"title": "Apple rallies", "description": "Shares gain"},
                {"title": null, "description": "orphan"},
                {"title": "  ", "description": ""}
            ]
        }))
        .unwrap();

        let headlines = parsed.into_headlines().unwrap();
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].title, "Apple rallies");
        assert_eq!(headlines[0].description.as_deref(), Some("Shares gain"));
    }

    #[test]
    fn error_status_is_an_error() {
        let parsed: EverythingResponse = serde_json::from_value(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        }))
        .unwrap();
        let err = parsed.into_headlines().unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }
}
