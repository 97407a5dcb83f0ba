use ammo_core::domain::{DataSource, Recommendation};

/// `1234.5` -> `$1,234.50`; negative values keep the sign in front of the dollar sign.
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i != 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents != 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

fn source(source: DataSource) -> &'static str {
    match source {
        DataSource::Live => "live",
        DataSource::Simulated => "simulated",
    }
}

pub fn summary_lines(rec: &Recommendation) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} ({}, {} prices) as of {}",
            rec.symbol(),
            rec.timeframe(),
            source(rec.data_source()),
            rec.generated_at().format("%Y-%m-%d %H:%M UTC")
        ),
        format!("Latest price:  {}", currency(rec.latest_price())),
        format!("Personality:   {}", rec.personality()),
        format!(
            "Sentiment:     {:+.2} ({}) {}",
            rec.sentiment().score,
            source(rec.sentiment().source),
            rec.sentiment().summary
        ),
        format!(
            "Signal:        {} (confidence {:.0}%)",
            rec.signal().label(),
            rec.confidence() * 100.0
        ),
    ];

    if let Some(m) = rec.metrics() {
        lines.push(format!(
            "Trend slope:   {:+.3}%/bar, volatility {:.1}% annualized",
            m.trend_slope * 100.0,
            m.annualized_volatility * 100.0
        ));
    }

    let p = rec.position();
    lines.push(format!(
        "Position:      {} shares ({} at risk, {} required)",
        p.shares,
        currency(p.risk_amount),
        currency(p.capital_required)
    ));
    if let (Some(stop), Some(target)) = (p.stop_loss_price, p.target_price) {
        lines.push(format!(
            "Stop / target: {} / {}",
            currency(stop),
            currency(target)
        ));
    }
    lines.push(String::new());
    lines.push(rec.reason().to_string());
    lines
}
