pub mod recommendation;
pub mod series;

pub use recommendation::{Action, Recommendation, Signal};
pub use series::{Bar, DataSource, Lookback, PriceSeries, Timeframe, MAX_LOOKBACK_DAYS};
