// Fixed-fractional position sizing.

use crate::domain::recommendation::Action;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Stop distance = price * per-bar volatility * this, when no explicit stop is given.
pub const VOLATILITY_STOP_MULTIPLIER: f64 = 2.0;
pub const RISK_REWARD_RATIO: f64 = 2.0;

// Absorbs representation error so that e.g. 100.0 / 2.0 style quotients floor correctly.
const FLOOR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub portfolio_value: f64,
    /// Fraction of the portfolio put at risk on one trade, in (0, 1].
    pub risk_fraction: f64,
    pub stop_distance: Option<f64>,
}

impl RiskParameters {
    pub fn new(
        portfolio_value: f64,
        risk_fraction: f64,
        stop_distance: Option<f64>,
    ) -> Result<Self, PipelineError> {
        let params = Self {
            portfolio_value,
            risk_fraction,
            stop_distance,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.portfolio_value.is_finite() || self.portfolio_value <= 0.0 {
            return Err(PipelineError::invalid_risk(format!(
                "portfolio value must be positive (got {})",
                self.portfolio_value
            )));
        }
        if !self.risk_fraction.is_finite() || self.risk_fraction <= 0.0 || self.risk_fraction > 1.0 {
            return Err(PipelineError::invalid_risk(format!(
                "risk fraction must be in (0, 1] (got {})",
                self.risk_fraction
            )));
        }
        if let Some(d) = self.stop_distance {
            if !d.is_finite() || d <= 0.0 {
                return Err(PipelineError::invalid_risk(format!(
                    "stop distance must be positive (got {d})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSize {
    pub shares: u64,
    pub risk_amount: f64,
    pub stop_distance: f64,
    pub capital_required: f64,
    pub stop_loss_price: Option<f64>,
    pub target_price: Option<f64>,
}

impl PositionSize {
    fn zero(risk_amount: f64, stop_distance: f64) -> Self {
        Self {
            shares: 0,
            risk_amount,
            stop_distance,
            capital_required: 0.0,
            stop_loss_price: None,
            target_price: None,
        }
    }

    /// Attaches stop and target levels for a directional trade; a hold carries no position.
    pub fn for_action(self, action: Action, entry_price: f64, reward_ratio: f64) -> Self {
        let d = self.stop_distance;
        match action {
            Action::Hold => Self::zero(self.risk_amount, d),
            _ if self.shares == 0 => self,
            Action::Buy => Self {
                stop_loss_price: Some((entry_price - d).max(0.0)),
                target_price: Some(entry_price + d * reward_ratio),
                ..self
            },
            Action::Sell => Self {
                stop_loss_price: Some(entry_price + d),
                target_price: Some((entry_price - d * reward_ratio).max(0.0)),
                ..self
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSizer {
    pub stop_multiplier: f64,
    pub reward_ratio: f64,
}

impl Default for RiskSizer {
    fn default() -> Self {
        Self {
            stop_multiplier: VOLATILITY_STOP_MULTIPLIER,
            reward_ratio: RISK_REWARD_RATIO,
        }
    }
}

impl RiskSizer {
    /// Shares such that hitting the stop loses `portfolio_value * risk_fraction`, capped so
    /// the position never costs more than the portfolio. A non-positive price, stop distance
    /// or volatility yields zero shares instead of an error.
    pub fn size_position(
        &self,
        params: &RiskParameters,
        price: f64,
        volatility: f64,
    ) -> Result<PositionSize, PipelineError> {
        params.validate()?;

        let risk_amount = params.portfolio_value * params.risk_fraction;
        let distance = params
            .stop_distance
            .unwrap_or(price * volatility * self.stop_multiplier);

        let price_ok = price.is_finite() && price > 0.0;
        let distance_ok = distance.is_finite() && distance > 0.0;
        if !price_ok || !distance_ok {
            tracing::debug!(price, volatility, distance, "degenerate sizing inputs; sizing to zero");
            let distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
            return Ok(PositionSize::zero(risk_amount, distance));
        }

        let by_risk = (risk_amount / distance + FLOOR_EPSILON).floor();
        let by_capital = (params.portfolio_value / price).floor();
        let shares = by_risk.min(by_capital).max(0.0) as u64;

        Ok(PositionSize {
            shares,
            risk_amount,
            stop_distance: distance,
            capital_required: shares as f64 * price,
            stop_loss_price: None,
            target_price: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fractional_example() {
        let params = RiskParameters::new(10_000.0, 0.01, Some(2.0)).unwrap();
        let size = RiskSizer::default().size_position(&params, 50.0, 0.0).unwrap();
        assert_eq!(size.shares, 50);
        assert_eq!(size.capital_required, 2_500.0);
        assert!(size.capital_required <= params.portfolio_value);
    }

    #[test]
    fn volatility_proxy_is_used_without_stop() {
        let params = RiskParameters::new(100_000.0, 0.02, None).unwrap();
        // distance = 100 * 0.01 * 2 = 2.0, risk = 2000 -> 1000 shares, capital cap = 1000.
        let size = RiskSizer::default().size_position(&params, 100.0, 0.01).unwrap();
        assert!((size.stop_distance - 2.0).abs() < 1e-12);
        assert_eq!(size.shares, 1_000);
    }

    #[test]
    fn capital_cap_binds_for_tight_stops() {
        let params = RiskParameters::new(10_000.0, 0.5, Some(0.01)).unwrap();
        let size = RiskSizer::default().size_position(&params, 50.0, 0.0).unwrap();
        assert_eq!(size.shares, 200);
        assert!(size.capital_required <= 10_000.0);
    }

    #[test]
    fn zero_volatility_or_price_degrades_to_zero() {
        let sizer = RiskSizer::default();
        let params = RiskParameters::new(10_000.0, 0.01, None).unwrap();
        assert_eq!(sizer.size_position(&params, 50.0, 0.0).unwrap().shares, 0);
        assert_eq!(sizer.size_position(&params, 0.0, 0.02).unwrap().shares, 0);
        assert_eq!(sizer.size_position(&params, f64::NAN, 0.02).unwrap().shares, 0);
        assert_eq!(sizer.size_position(&params, 50.0, -0.3).unwrap().shares, 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(RiskParameters::new(0.0, 0.01, None).is_err());
        assert!(RiskParameters::new(-5.0, 0.01, None).is_err());
        assert!(RiskParameters::new(1_000.0, 0.0, None).is_err());
        assert!(RiskParameters::new(1_000.0, 1.5, None).is_err());
        assert!(RiskParameters::new(1_000.0, 1.0, None).is_ok());
        assert!(RiskParameters::new(1_000.0, 0.1, Some(0.0)).is_err());

        let raw = RiskParameters {
            portfolio_value: 1_000.0,
            risk_fraction: 2.0,
            stop_distance: None,
        };
        let err = RiskSizer::default().size_position(&raw, 10.0, 0.01).unwrap_err();
        assert_eq!(err.kind(), "invalid_risk_parameters");
    }

    #[test]
    fn size_stays_within_capital_bounds() {
        let sizer = RiskSizer::default();
        for pv in [500.0, 10_000.0, 250_000.0] {
            for rf in [0.001, 0.02, 0.5, 1.0] {
                for price in [0.5, 13.7, 50.0, 999.0] {
                    for vol in [0.0, 0.001, 0.02, 0.3] {
                        let params = RiskParameters::new(pv, rf, None).unwrap();
                        let size = sizer.size_position(&params, price, vol).unwrap();
                        assert!(size.shares as f64 <= pv / price);
                        assert!(size.capital_required <= pv);
                    }
                }
            }
        }
    }

    #[test]
    fn action_levels_follow_direction() {
        let params = RiskParameters::new(10_000.0, 0.01, Some(2.0)).unwrap();
        let sized = RiskSizer::default().size_position(&params, 50.0, 0.0).unwrap();

        let long = sized.for_action(Action::Buy, 50.0, RISK_REWARD_RATIO);
        assert_eq!(long.stop_loss_price, Some(48.0));
        assert_eq!(long.target_price, Some(54.0));

        let short = sized.for_action(Action::Sell, 50.0, RISK_REWARD_RATIO);
        assert_eq!(short.stop_loss_price, Some(52.0));
        assert_eq!(short.target_price, Some(46.0));

        let hold = sized.for_action(Action::Hold, 50.0, RISK_REWARD_RATIO);
        assert_eq!(hold.shares, 0);
        assert_eq!(hold.capital_required, 0.0);
        assert!(hold.stop_loss_price.is_none());
    }
}
