use crate::sentiment::Headline;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "rallies", "surge", "surges", "gain", "gains", "profit", "growth",
    "beat", "beats", "upgrade", "upgraded", "outperform", "strong", "positive", "rise",
    "rises", "increase", "breakthrough", "record", "success", "exceed", "exceeds",
    "momentum", "optimistic", "advance", "dividend", "buyback", "upside", "recovery",
    "rebound", "expansion", "robust", "accelerating", "overweight", "raised", "tailwind",
    "soar", "soars", "jump", "jumps",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "plunge",
    "plunges", "crash", "miss", "misses", "downgrade", "downgraded", "underperform",
    "weak", "negative", "drop", "drops", "decrease", "concern", "concerns", "fail",
    "fails", "disappoint", "disappoints", "slump", "warning", "pessimistic", "retreat",
    "fear", "fears", "trouble", "dilution", "headwind", "lawsuit", "litigation", "recall",
    "investigation", "probe", "default", "bankruptcy", "layoff", "layoffs", "downside",
    "overvalued", "underweight", "lowered", "suspended", "tumble", "tumbles", "slide",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't",
    "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "without",
];

/// Words after a negation that get their polarity flipped.
const NEGATION_WINDOW: usize = 3;
const TITLE_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalScore {
    /// Mean polarity over headlines that contained any sentiment word, in [-1, 1].
    pub score: f64,
    pub scored: usize,
}

#[derive(Debug, Clone)]
pub struct LexicalScorer {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }
}

impl LexicalScorer {
    fn count(&self, text: &str) -> (f64, f64) {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"' | '(' | ')'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut last_negation: Option<usize> = None;
        let (mut pos, mut neg) = (0.0, 0.0);
        for (i, word) in words.iter().enumerate() {
            if self.negation.contains(word) {
                last_negation = Some(i);
                continue;
            }

            let is_positive = self.positive.contains(word);
            let is_negative = self.negative.contains(word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = last_negation.is_some_and(|n| i - n <= NEGATION_WINDOW);
            if is_positive != negated {
                pos += 1.0;
            } else {
                neg += 1.0;
            }
        }
        (pos, neg)
    }

    /// Polarity of one headline, or `None` when it holds no sentiment words.
    pub fn score_headline(&self, headline: &Headline) -> Option<f64> {
        let (title_pos, title_neg) = self.count(&headline.title);
        let (desc_pos, desc_neg) = headline
            .description
            .as_deref()
            .map(|d| self.count(d))
            .unwrap_or((0.0, 0.0));

        let pos = title_pos * TITLE_WEIGHT + desc_pos;
        let neg = title_neg * TITLE_WEIGHT + desc_neg;
        if pos + neg == 0.0 {
            return None;
        }
        Some((pos - neg) / (pos + neg))
    }

    pub fn score(&self, headlines: &[Headline]) -> LexicalScore {
        let scores: Vec<f64> = headlines
            .iter()
            .filter_map(|h| self.score_headline(h))
            .collect();

        if scores.is_empty() {
            return LexicalScore {
                score: 0.0,
                scored: 0,
            };
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        LexicalScore {
            score: mean.clamp(-1.0, 1.0),
            scored: scores.len(),
        }
    }
}
