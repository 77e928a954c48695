use crate::models::SeriesPoint;
use statrs::statistics::Statistics;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const RISK_FREE_RATE: f64 = 0.02;

/// Return over the whole series relative to its first value. Zero for
/// degenerate input.
pub fn total_return(series: &[SeriesPoint]) -> f64 {
    let first = match series.first() {
        Some(point) if point.portfolio_value > 0.0 => point.portfolio_value,
        _ => return 0.0,
    };
    let last = match series.last() {
        Some(point) if point.portfolio_value.is_finite() => point.portfolio_value,
        _ => return 0.0,
    };
    last / first - 1.0
}

/// Annualized Sharpe ratio over the portfolio leg, assuming daily values.
pub fn sharpe_ratio(series: &[SeriesPoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = series
        .windows(2)
        .map(|window| {
            let prev = window[0].portfolio_value;
            let curr = window[1].portfolio_value;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .filter(|value| value.is_finite())
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let mean_return = returns.clone().mean();
    let std_dev = returns.std_dev();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    let annualized_return = mean_return * TRADING_DAYS_PER_YEAR;
    let annualized_volatility = std_dev * TRADING_DAYS_PER_YEAR.sqrt();
    (annualized_return - RISK_FREE_RATE) / annualized_volatility
}

/// Largest peak-to-trough decline of the portfolio leg, as a positive
/// fraction of the peak.
pub fn max_drawdown(series: &[SeriesPoint]) -> f64 {
    let mut max_drawdown = 0.0_f64;
    let mut peak = match series.first() {
        Some(point) => point.portfolio_value,
        None => return 0.0,
    };

    for point in series {
        if point.portfolio_value > peak {
            peak = point.portfolio_value;
        } else if peak > 0.0 {
            let drawdown = (peak - point.portfolio_value) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }

    max_drawdown
}
