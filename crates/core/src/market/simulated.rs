use crate::domain::series::{Bar, PriceSeries, Timeframe};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const DEFAULT_BARS: usize = 100;
const START_PRICE: f64 = 100.0;
const BAR_SHOCK: f64 = 0.01;
const OPEN_JITTER: f64 = 0.005;
const WICK: f64 = 0.01;
const MIN_PRICE: f64 = 0.01;
const MIN_VOLUME: u64 = 1_000_000;
const MAX_VOLUME: u64 = 10_000_000;

/// Seeds an RNG for one request. With a configured seed the stream depends only on
/// `(seed, symbol, salt)`; without one it is drawn from OS entropy.
pub(crate) fn request_rng(seed: Option<u64>, symbol: &str, salt: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(symbol.as_bytes()) ^ salt),
        None => StdRng::from_entropy(),
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[derive(Debug, Clone)]
pub struct SimulatedMarketData {
    seed: Option<u64>,
    bars: usize,
}

impl Default for SimulatedMarketData {
    fn default() -> Self {
        Self {
            seed: None,
            bars: DEFAULT_BARS,
        }
    }
}

impl SimulatedMarketData {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_bars(mut self, bars: usize) -> Self {
        self.bars = bars;
        self
    }

    pub fn generate(&self, symbol: &str, timeframe: Timeframe, end: DateTime<Utc>) -> PriceSeries {
        let mut rng = request_rng(self.seed, symbol, 0x5052_4943_4553);
        let spacing = timeframe.bar_spacing();

        let mut close = START_PRICE;
        let mut bars = Vec::with_capacity(self.bars);
        for i in 0..self.bars {
            let shock: f64 = rng.sample(StandardNormal);
            close = (close * (1.0 + BAR_SHOCK * shock)).max(MIN_PRICE);

            let open = (close * (1.0 + OPEN_JITTER * rng.gen_range(-1.0..1.0))).max(MIN_PRICE);
            let high = open.max(close) * (1.0 + WICK * rng.gen::<f64>());
            let low = (open.min(close) * (1.0 - WICK * rng.gen::<f64>())).max(MIN_PRICE);
            let volume = rng.gen_range(MIN_VOLUME..MAX_VOLUME) as f64;

            let bars_before_end = (self.bars - 1 - i) as i32;
            bars.push(Bar {
                timestamp: end - spacing * bars_before_end,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        tracing::debug!(symbol, %timeframe, bars = bars.len(), "generated simulated price series");
        PriceSeries::new(symbol, timeframe, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn produces_well_formed_bars() {
        let series = SimulatedMarketData::default().generate("AAPL", Timeframe::Daily, end());
        assert_eq!(series.len(), DEFAULT_BARS);
        assert_eq!(series.bars().last().unwrap().timestamp, end());
        for bar in series.bars() {
            assert!(bar.close > 0.0);
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
            assert!((MIN_VOLUME as f64..MAX_VOLUME as f64).contains(&bar.volume));
        }
        assert!(series.bars().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn seeded_generation_is_reproducible_per_symbol() {
        let sim = SimulatedMarketData::new(Some(7));
        let a = sim.generate("AAPL", Timeframe::Daily, end());
        let b = sim.generate("AAPL", Timeframe::Daily, end());
        let c = sim.generate("MSFT", Timeframe::Daily, end());
        assert_eq!(a, b);
        assert_ne!(a.closes(), c.closes());
    }

    #[test]
    fn spacing_follows_timeframe() {
        let series = SimulatedMarketData::new(Some(1))
            .with_bars(3)
            .generate("SPY", Timeframe::Weekly, end());
        let bars = series.bars();
        assert_eq!(bars[1].timestamp - bars[0].timestamp, chrono::Duration::weeks(1));
    }
}
