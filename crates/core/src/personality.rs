use crate::domain::series::PriceSeries;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonalityLabel {
    TrendingUp,
    TrendingDown,
    Volatile,
    RangeBound,
    InsufficientData,
}

impl PersonalityLabel {
    pub const ALL: [PersonalityLabel; 5] = [
        PersonalityLabel::TrendingUp,
        PersonalityLabel::TrendingDown,
        PersonalityLabel::Volatile,
        PersonalityLabel::RangeBound,
        PersonalityLabel::InsufficientData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PersonalityLabel::TrendingUp => "Trending Up",
            PersonalityLabel::TrendingDown => "Trending Down",
            PersonalityLabel::Volatile => "Volatile",
            PersonalityLabel::RangeBound => "Range-Bound",
            PersonalityLabel::InsufficientData => "Insufficient Data",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PersonalityLabel::TrendingUp => 0,
            PersonalityLabel::TrendingDown => 1,
            PersonalityLabel::Volatile => 2,
            PersonalityLabel::RangeBound => 3,
            PersonalityLabel::InsufficientData => 4,
        }
    }
}

impl fmt::Display for PersonalityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBucket {
    Up,
    Flat,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityBucket {
    Calm,
    Elevated,
}

/// Trend dominates: a clear slope wins regardless of volatility.
pub fn label_for(trend: TrendBucket, volatility: VolatilityBucket) -> PersonalityLabel {
    match (trend, volatility) {
        (TrendBucket::Up, VolatilityBucket::Calm) => PersonalityLabel::TrendingUp,
        (TrendBucket::Up, VolatilityBucket::Elevated) => PersonalityLabel::TrendingUp,
        (TrendBucket::Down, VolatilityBucket::Calm) => PersonalityLabel::TrendingDown,
        (TrendBucket::Down, VolatilityBucket::Elevated) => PersonalityLabel::TrendingDown,
        (TrendBucket::Flat, VolatilityBucket::Elevated) => PersonalityLabel::Volatile,
        (TrendBucket::Flat, VolatilityBucket::Calm) => PersonalityLabel::RangeBound,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetrics {
    /// Least-squares slope of closes per bar, as a fraction of the mean close.
    pub trend_slope: f64,
    /// Sample standard deviation of simple per-bar returns.
    pub bar_volatility: f64,
    pub annualized_volatility: f64,
    pub bars_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalityThresholds {
    pub min_bars: usize,
    pub window: usize,
    pub trend_slope: f64,
    pub annualized_volatility: f64,
}

impl Default for PersonalityThresholds {
    fn default() -> Self {
        Self {
            min_bars: 20,
            window: 30,
            trend_slope: 0.002,
            annualized_volatility: 0.30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonalityClassifier {
    thresholds: PersonalityThresholds,
}

impl PersonalityClassifier {
    pub fn new(thresholds: PersonalityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PersonalityThresholds {
        &self.thresholds
    }

    /// Errors with `InsufficientHistory` when fewer than two closes exist.
    pub fn metrics(&self, series: &PriceSeries) -> Result<SeriesMetrics, PipelineError> {
        let closes = series.closes();
        if closes.len() < 2 {
            return Err(PipelineError::InsufficientHistory {
                required: 2,
                actual: closes.len(),
            });
        }

        let window = self.thresholds.window.max(2);
        let tail = &closes[closes.len().saturating_sub(window)..];

        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        let slope = least_squares_slope(tail);
        let trend_slope = if mean > 0.0 && slope.is_finite() {
            slope / mean
        } else {
            0.0
        };

        let bar_volatility = sample_std(&simple_returns(tail));
        let annualized_volatility = bar_volatility * series.timeframe().periods_per_year().sqrt();

        Ok(SeriesMetrics {
            trend_slope,
            bar_volatility,
            annualized_volatility,
            bars_used: tail.len(),
        })
    }

    pub fn trend_bucket(&self, metrics: &SeriesMetrics) -> TrendBucket {
        if metrics.trend_slope > self.thresholds.trend_slope {
            TrendBucket::Up
        } else if metrics.trend_slope < -self.thresholds.trend_slope {
            TrendBucket::Down
        } else {
            TrendBucket::Flat
        }
    }

    pub fn volatility_bucket(&self, metrics: &SeriesMetrics) -> VolatilityBucket {
        if metrics.annualized_volatility > self.thresholds.annualized_volatility {
            VolatilityBucket::Elevated
        } else {
            VolatilityBucket::Calm
        }
    }

    pub fn classify(&self, series: &PriceSeries) -> PersonalityLabel {
        self.assess(series).0
    }

    pub fn assess(&self, series: &PriceSeries) -> (PersonalityLabel, Option<SeriesMetrics>) {
        let metrics = self.metrics(series).ok();
        if series.len() < self.thresholds.min_bars {
            tracing::debug!(
                symbol = series.symbol(),
                bars = series.len(),
                min_bars = self.thresholds.min_bars,
                "not enough bars to classify personality"
            );
            return (PersonalityLabel::InsufficientData, metrics);
        }

        let Some(m) = metrics else {
            return (PersonalityLabel::InsufficientData, None);
        };

        let label = label_for(self.trend_bucket(&m), self.volatility_bucket(&m));
        tracing::info!(
            symbol = series.symbol(),
            %label,
            trend_slope = m.trend_slope,
            annualized_volatility = m.annualized_volatility,
            "classified market personality"
        );
        (label, Some(m))
    }
}

fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::{Bar, Timeframe};
    use chrono::{Duration, TimeZone, Utc};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 1_000.0,
            })
            .collect();
        PriceSeries::new("TEST", Timeframe::Daily, bars)
    }

    #[test]
    fn steady_uptrend_is_trending_up() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes);
        let classifier = PersonalityClassifier::default();
        assert_eq!(classifier.classify(&s), PersonalityLabel::TrendingUp);

        let m = classifier.metrics(&s).unwrap();
        assert!(m.annualized_volatility < 0.30);
        assert_eq!(m.bars_used, 30);
    }

    #[test]
    fn steady_downtrend_is_trending_down() {
        let closes: Vec<f64> = (0..50).map(|i| 200.0 - 1.5 * i as f64).collect();
        assert_eq!(
            PersonalityClassifier::default().classify(&series(&closes)),
            PersonalityLabel::TrendingDown
        );
    }

    #[test]
    fn flat_choppy_series_is_volatile() {
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 106.0 })
            .collect();
        assert_eq!(
            PersonalityClassifier::default().classify(&series(&closes)),
            PersonalityLabel::Volatile
        );
    }

    #[test]
    fn flat_quiet_series_is_range_bound() {
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.2 })
            .collect();
        assert_eq!(
            PersonalityClassifier::default().classify(&series(&closes)),
            PersonalityLabel::RangeBound
        );
    }

    #[test]
    fn short_series_is_insufficient_data_not_error() {
        let classifier = PersonalityClassifier::default();
        assert_eq!(classifier.classify(&series(&[])), PersonalityLabel::InsufficientData);
        assert_eq!(
            classifier.classify(&series(&[1.0, 2.0, 3.0])),
            PersonalityLabel::InsufficientData
        );

        let err = classifier.metrics(&series(&[5.0])).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 2, actual: 1 });
    }

    #[test]
    fn classification_is_deterministic() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        let s = series(&closes);
        let classifier = PersonalityClassifier::default();
        let first = classifier.classify(&s);
        for _ in 0..5 {
            assert_eq!(classifier.classify(&s), first);
        }
        assert!(PersonalityLabel::ALL.contains(&first));
    }

    #[test]
    fn label_table_covers_every_bucket_pair() {
        for trend in [TrendBucket::Up, TrendBucket::Flat, TrendBucket::Down] {
            for vol in [VolatilityBucket::Calm, VolatilityBucket::Elevated] {
                assert_ne!(label_for(trend, vol), PersonalityLabel::InsufficientData);
            }
        }
    }
}
