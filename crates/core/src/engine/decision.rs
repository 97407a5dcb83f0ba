use crate::domain::recommendation::{Action, Signal};
use crate::personality::PersonalityLabel;
use crate::sentiment::SentimentBucket;
use serde::Serialize;

pub const SENTIMENT_CONFIDENCE_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    StrongAlignment,
    Alignment,
    Conflicting,
    NoDirection,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub signal: Signal,
    pub base_confidence: f64,
    pub rationale: Rationale,
}

const fn cell(signal: Signal, base_confidence: f64, rationale: Rationale) -> Decision {
    Decision {
        signal,
        base_confidence,
        rationale,
    }
}

const BUY: Decision = cell(Signal::Buy, 0.55, Rationale::Alignment);
const STRONG_BUY: Decision = cell(Signal::StrongBuy, 0.7, Rationale::StrongAlignment);
const SELL: Decision = cell(Signal::Sell, 0.55, Rationale::Alignment);
const STRONG_SELL: Decision = cell(Signal::StrongSell, 0.7, Rationale::StrongAlignment);
const HOLD_CONFLICT: Decision = cell(Signal::Hold, 0.35, Rationale::Conflicting);
const HOLD_NO_DIRECTION: Decision = cell(Signal::Hold, 0.5, Rationale::NoDirection);
const HOLD_INSUFFICIENT: Decision = cell(Signal::Hold, 0.2, Rationale::InsufficientData);

/// Rows follow `PersonalityLabel::ALL`, columns follow `SentimentBucket::ALL`
/// (very negative .. very positive).
pub const DECISION_TABLE: [[Decision; 5]; 5] = [
    // Trending Up
    [HOLD_CONFLICT, HOLD_CONFLICT, HOLD_CONFLICT, BUY, STRONG_BUY],
    // Trending Down
    [STRONG_SELL, SELL, HOLD_CONFLICT, HOLD_CONFLICT, HOLD_CONFLICT],
    // Volatile
    [HOLD_NO_DIRECTION; 5],
    // Range-Bound
    [HOLD_NO_DIRECTION; 5],
    // Insufficient Data
    [HOLD_INSUFFICIENT; 5],
];

pub fn decide(label: PersonalityLabel, bucket: SentimentBucket) -> Decision {
    DECISION_TABLE[label.index()][bucket.index()]
}

pub fn confidence(decision: &Decision, sentiment_score: f64) -> f64 {
    let c = match decision.signal.action() {
        Action::Hold => decision.base_confidence,
        Action::Buy | Action::Sell => {
            decision.base_confidence + SENTIMENT_CONFIDENCE_WEIGHT * sentiment_score.abs()
        }
    };
    c.clamp(0.0, 1.0)
}

pub fn reason(decision: &Decision, label: PersonalityLabel, sentiment_score: f64) -> String {
    let s = sentiment_score;
    match (decision.rationale, decision.signal.action()) {
        (Rationale::StrongAlignment, Action::Buy) => format!(
            "The stock is in a strong '{label}' pattern with very positive sentiment (score: {s:.2}). This indicates a high-confidence buying opportunity."
        ),
        (Rationale::Alignment, Action::Buy) => format!(
            "The stock is in a '{label}' pattern and sentiment is positive (score: {s:.2}). This alignment suggests a potential buying opportunity."
        ),
        (Rationale::StrongAlignment, _) => format!(
            "The stock is in a strong '{label}' pattern with very negative sentiment (score: {s:.2}). This indicates a high-confidence selling or shorting opportunity."
        ),
        (Rationale::Alignment, _) => format!(
            "The stock is in a '{label}' pattern and sentiment is negative (score: {s:.2}). This alignment suggests a potential selling or shorting opportunity."
        ),
        (Rationale::NoDirection, _) => format!(
            "The market personality is '{label}', which lacks a clear directional trend. Wait for a clearer structure before entering a trade."
        ),
        (Rationale::Conflicting, _) => format!(
            "The signals conflict: the personality is '{label}' but sentiment is neutral or contrary (score: {s:.2}). Stay on the sidelines."
        ),
        (Rationale::InsufficientData, _) => {
            "There is not enough price history to read the market personality. No trade is advised.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptrend_with_strong_sentiment_buys() {
        let d = decide(PersonalityLabel::TrendingUp, SentimentBucket::from_score(0.6));
        assert_eq!(d.signal, Signal::StrongBuy);
        assert_eq!(d.signal.action(), Action::Buy);

        let d = decide(PersonalityLabel::TrendingUp, SentimentBucket::from_score(0.3));
        assert_eq!(d.signal, Signal::Buy);
    }

    #[test]
    fn downtrend_with_negative_sentiment_sells() {
        assert_eq!(
            decide(PersonalityLabel::TrendingDown, SentimentBucket::VeryNegative).signal,
            Signal::StrongSell
        );
        assert_eq!(
            decide(PersonalityLabel::TrendingDown, SentimentBucket::Negative).signal,
            Signal::Sell
        );
    }

    #[test]
    fn contrary_sentiment_holds() {
        let d = decide(PersonalityLabel::TrendingUp, SentimentBucket::Negative);
        assert_eq!(d.signal, Signal::Hold);
        assert_eq!(d.rationale, Rationale::Conflicting);
    }

    #[test]
    fn table_is_total_and_confidence_bounded() {
        for label in PersonalityLabel::ALL {
            for bucket in SentimentBucket::ALL {
                let d = decide(label, bucket);
                for score in [-1.0, -0.5, 0.0, 0.5, 1.0] {
                    let c = confidence(&d, score);
                    assert!((0.0..=1.0).contains(&c));
                }
                assert!(!reason(&d, label, 0.0).is_empty());
            }
        }
    }

    #[test]
    fn directionless_regimes_never_trade() {
        for label in [
            PersonalityLabel::Volatile,
            PersonalityLabel::RangeBound,
            PersonalityLabel::InsufficientData,
        ] {
            for bucket in SentimentBucket::ALL {
                assert_eq!(decide(label, bucket).signal.action(), Action::Hold);
            }
        }
    }

    #[test]
    fn stronger_sentiment_raises_directional_confidence() {
        let d = decide(PersonalityLabel::TrendingUp, SentimentBucket::VeryPositive);
        assert!(confidence(&d, 0.9) > confidence(&d, 0.6));

        let hold = decide(PersonalityLabel::RangeBound, SentimentBucket::VeryPositive);
        assert_eq!(confidence(&hold, 0.9), hold.base_confidence);
    }
}
