use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ammo_core::domain::{Lookback, Recommendation, Timeframe, MAX_LOOKBACK_DAYS};
use ammo_core::engine::RecommendationEngine;

mod format;

#[derive(Debug, Parser)]
#[command(name = "ammo_cli", about = "Analyse one symbol and print a trading recommendation")]
struct Args {
    /// Ticker to analyse, e.g. AAPL.
    symbol: String,

    /// Bar resolution: daily, weekly or hourly.
    #[arg(long, default_value = "daily")]
    timeframe: Timeframe,

    /// Days of history to request. Defaults to the timeframe's usual lookback.
    #[arg(long)]
    days: Option<u32>,

    /// Portfolio value. Defaults to PORTFOLIO_VALUE.
    #[arg(long)]
    portfolio_value: Option<f64>,

    /// Fraction of the portfolio to risk, in (0, 1]. Defaults to RISK_PER_TRADE.
    #[arg(long)]
    risk_fraction: Option<f64>,

    /// Distance from entry to stop-loss in price units. Defaults to a volatility-based stop.
    #[arg(long)]
    stop_distance: Option<f64>,

    /// Print the full recommendation as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ammo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let mut lookback = Lookback::default_for(args.timeframe);
    if let Some(days) = args.days {
        lookback.days = days;
        anyhow::ensure!(
            lookback.is_within_limit(),
            "--days must be between 1 and {MAX_LOOKBACK_DAYS}"
        );
    }

    let mut params = settings.default_risk_parameters();
    if let Some(v) = args.portfolio_value {
        params.portfolio_value = v;
    }
    if let Some(v) = args.risk_fraction {
        params.risk_fraction = v;
    }
    params.stop_distance = args.stop_distance;

    tracing::info!(symbol = %args.symbol, timeframe = %lookback.timeframe, days = lookback.days, "cli start");

    let engine = RecommendationEngine::from_settings(&settings)?;
    let recommendation = match engine.recommend_with(&args.symbol, lookback, &params).await {
        Ok(r) => r,
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    tracing::info!(
        symbol = recommendation.symbol(),
        signal = recommendation.signal().label(),
        "cli done"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        print_summary(&recommendation);
    }

    Ok(())
}

fn print_summary(rec: &Recommendation) {
    for line in format::summary_lines(rec) {
        println!("{line}");
    }
}

fn init_sentry(settings: &ammo_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
